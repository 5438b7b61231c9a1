//! JSON scene description.
//!
//! Angles are written in degrees and quaternions as `[w, x, y, z]`. Omitted jiggle settings
//! take the defaults from [`JiggleSettings::default`].

use crate::{
    Action, Armature, ArmatureData, BoneData, BoneTrack, Error, JiggleSettings, QuatFrame,
    Rotation, RotationMode, Scene, TrackChannel, Vec3Frame,
};
use glam::{Quat, Vec3};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Root {
    #[serde(default)]
    scene: Option<SceneHeader>,
    #[serde(default)]
    armatures: Vec<ArmatureDef>,
}

fn default_frame_start() -> i32 {
    1
}

fn default_frame_end() -> i32 {
    250
}

#[derive(Debug, Deserialize)]
struct SceneHeader {
    #[serde(default = "default_frame_start", rename = "frameStart")]
    frame_start: i32,
    #[serde(default = "default_frame_end", rename = "frameEnd")]
    frame_end: i32,
}

#[derive(Debug, Deserialize)]
struct ArmatureDef {
    name: String,
    #[serde(default)]
    bones: Vec<BoneDef>,
    #[serde(default)]
    actions: BTreeMap<String, BTreeMap<String, ChannelsDef>>,
    /// Active action name.
    #[serde(default)]
    action: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BoneDef {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    head: [f32; 3],
    #[serde(default, rename = "restRotation")]
    rest_rotation: [f32; 3],
    #[serde(default, rename = "rotationMode")]
    rotation_mode: Option<String>,
    #[serde(default)]
    rotation: [f32; 3],
    #[serde(default)]
    jiggle: JiggleDef,
}

fn default_stiffness() -> f32 {
    JiggleSettings::DEFAULT_STIFFNESS
}

fn default_dampen() -> f32 {
    JiggleSettings::DEFAULT_DAMPEN
}

fn default_amplitude() -> f32 {
    JiggleSettings::DEFAULT_AMPLITUDE
}

fn default_stretch() -> f32 {
    JiggleSettings::DEFAULT_STRETCH
}

#[derive(Debug, Deserialize)]
struct JiggleDef {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    animated: bool,
    #[serde(default = "default_stiffness")]
    stiffness: f32,
    #[serde(default = "default_dampen")]
    dampen: f32,
    #[serde(default = "default_amplitude")]
    amplitude: f32,
    #[serde(default = "default_stretch")]
    stretch: f32,
}

impl Default for JiggleDef {
    fn default() -> Self {
        let d = JiggleSettings::default();
        Self {
            enabled: d.enabled,
            animated: d.animated,
            stiffness: d.stiffness,
            dampen: d.dampen,
            amplitude: d.amplitude,
            stretch: d.stretch,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ChannelsDef {
    #[serde(default)]
    location: Vec<Vec3KeyDef>,
    /// XYZ euler, degrees.
    #[serde(default)]
    rotation: Vec<Vec3KeyDef>,
    #[serde(default)]
    quaternion: Vec<QuatKeyDef>,
    #[serde(default)]
    scale: Vec<Vec3KeyDef>,
}

#[derive(Debug, Deserialize)]
struct Vec3KeyDef {
    frame: f32,
    value: [f32; 3],
}

#[derive(Debug, Deserialize)]
struct QuatKeyDef {
    frame: f32,
    value: [f32; 4],
}

fn euler_degrees(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0].to_radians(), v[1].to_radians(), v[2].to_radians())
}

fn parse_rotation_mode(bone: &str, raw: Option<&str>) -> Result<RotationMode, Error> {
    match raw {
        None | Some("QUATERNION") => Ok(RotationMode::Quaternion),
        Some("XYZ") => Ok(RotationMode::Euler),
        Some(other) => Err(Error::JsonUnsupportedRotationMode {
            bone: bone.to_string(),
            value: other.to_string(),
        }),
    }
}

impl ArmatureData {
    /// Parses a single armature object (the elements of a scene's `armatures` array).
    pub fn from_json_str(input: &str) -> Result<Arc<Self>, Error> {
        let def: ArmatureDef = serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })?;
        Ok(armature_data_from_def(def)?.0)
    }
}

impl Scene {
    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        let root: Root = serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })?;

        let (frame_start, frame_end) = match root.scene {
            Some(s) => (s.frame_start, s.frame_end),
            None => (default_frame_start(), default_frame_end()),
        };

        let mut armatures = Vec::with_capacity(root.armatures.len());
        for def in root.armatures {
            let (data, active_action) = armature_data_from_def(def)?;
            let mut armature = Armature::new(data);
            armature.set_active_action(active_action.as_deref())?;
            armatures.push(armature);
        }

        Scene::new(armatures, frame_start, frame_end)
    }
}

fn armature_data_from_def(def: ArmatureDef) -> Result<(Arc<ArmatureData>, Option<String>), Error> {
    let mut bones = Vec::with_capacity(def.bones.len());
    let mut bone_index = HashMap::<String, usize>::new();
    for bone in def.bones {
        let parent = match bone.parent.as_deref() {
            None => None,
            Some(parent_name) => Some(*bone_index.get(parent_name).ok_or_else(|| {
                Error::JsonUnknownBoneParent {
                    bone: bone.name.clone(),
                    parent: parent_name.to_string(),
                }
            })?),
        };
        if bone_index.contains_key(&bone.name) {
            return Err(Error::JsonDuplicateBone {
                armature: def.name.clone(),
                bone: bone.name,
            });
        }

        let mode = parse_rotation_mode(&bone.name, bone.rotation_mode.as_deref())?;
        let rotation = Rotation::Euler(euler_degrees(bone.rotation)).with_mode(mode);
        let j = bone.jiggle;

        bone_index.insert(bone.name.clone(), bones.len());
        bones.push(BoneData {
            name: bone.name,
            parent,
            head: Vec3::from_array(bone.head),
            rest_rotation: crate::quat_from_euler(euler_degrees(bone.rest_rotation)),
            rotation,
            jiggle: JiggleSettings {
                enabled: j.enabled,
                animated: j.animated,
                stiffness: j.stiffness,
                dampen: j.dampen,
                amplitude: j.amplitude,
                stretch: j.stretch,
            },
        });
    }

    let mut actions = Vec::with_capacity(def.actions.len());
    for (action_name, channels_by_bone) in def.actions {
        let mut tracks = Vec::new();
        for (bone_name, channels) in channels_by_bone {
            let index = *bone_index.get(&bone_name).ok_or_else(|| {
                Error::JsonUnknownActionBone {
                    action: action_name.clone(),
                    bone: bone_name.clone(),
                }
            })?;
            let invalid = |message: String| Error::JsonInvalidKeyframes {
                action: action_name.clone(),
                bone: bone_name.clone(),
                message,
            };

            if !channels.location.is_empty() {
                let frames = vec3_frames(&channels.location, Vec3::from_array)
                    .map_err(|m| invalid(format!("location: {m}")))?;
                tracks.push(BoneTrack {
                    bone_index: index,
                    channel: TrackChannel::Location(frames),
                });
            }
            if !channels.rotation.is_empty() {
                let frames = vec3_frames(&channels.rotation, euler_degrees)
                    .map_err(|m| invalid(format!("rotation: {m}")))?;
                tracks.push(BoneTrack {
                    bone_index: index,
                    channel: TrackChannel::RotationEuler(frames),
                });
            }
            if !channels.quaternion.is_empty() {
                let frames = quat_frames(&channels.quaternion)
                    .map_err(|m| invalid(format!("quaternion: {m}")))?;
                tracks.push(BoneTrack {
                    bone_index: index,
                    channel: TrackChannel::RotationQuaternion(frames),
                });
            }
            if !channels.scale.is_empty() {
                let frames = vec3_frames(&channels.scale, Vec3::from_array)
                    .map_err(|m| invalid(format!("scale: {m}")))?;
                tracks.push(BoneTrack {
                    bone_index: index,
                    channel: TrackChannel::Scale(frames),
                });
            }
        }
        actions.push(Action {
            name: action_name,
            tracks,
        });
    }

    if let Some(active) = def
        .action
        .as_deref()
        .filter(|name| !actions.iter().any(|a| a.name == *name))
    {
        return Err(Error::UnknownAction {
            name: active.to_string(),
        });
    }

    let data = ArmatureData::new(def.name, bones, actions)?;
    Ok((data, def.action))
}

fn check_frame_order(frames: impl Iterator<Item = f32>) -> Result<(), String> {
    let mut last = f32::NEG_INFINITY;
    for frame in frames {
        if !frame.is_finite() {
            return Err(format!("non-finite frame {frame}"));
        }
        if frame < last {
            return Err(format!("frame {frame} comes after frame {last}"));
        }
        last = frame;
    }
    Ok(())
}

fn vec3_frames(
    keys: &[Vec3KeyDef],
    convert: impl Fn([f32; 3]) -> Vec3,
) -> Result<Vec<Vec3Frame>, String> {
    check_frame_order(keys.iter().map(|k| k.frame))?;
    keys.iter()
        .map(|k| {
            let value = convert(k.value);
            if !value.is_finite() {
                return Err(format!("non-finite value at frame {}", k.frame));
            }
            Ok(Vec3Frame {
                frame: k.frame,
                value,
            })
        })
        .collect()
}

fn quat_frames(keys: &[QuatKeyDef]) -> Result<Vec<QuatFrame>, String> {
    check_frame_order(keys.iter().map(|k| k.frame))?;
    keys.iter()
        .map(|k| {
            let [w, x, y, z] = k.value;
            let q = Quat::from_xyzw(x, y, z, w);
            if !q.is_finite() || q.length_squared() <= 1.0e-12 {
                return Err(format!("degenerate quaternion at frame {}", k.frame));
            }
            Ok(QuatFrame {
                frame: k.frame,
                value: q.normalize(),
            })
        })
        .collect()
}
