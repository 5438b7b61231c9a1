use glam::{Quat, Vec3};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-bone jiggle configuration.
///
/// `stiffness`, `dampen` and `stretch` are meant to live in `0..=1`. Nothing clamps them; use
/// [`JiggleSettings::validate`] to opt into a range check.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JiggleSettings {
    /// Bone participates in simulation.
    pub enabled: bool,
    /// Bone has rotation keyframes. Animated bones are stepped after pose evaluation and their
    /// keyed rotation change also drives the spring.
    pub animated: bool,
    /// How quickly the spring pulls back to neutral.
    pub stiffness: f32,
    /// Fraction of velocity lost per frame.
    pub dampen: f32,
    /// Degrees of rotation per unit of tension.
    pub amplitude: f32,
    /// Fraction of the Y lag turned into Y scale.
    pub stretch: f32,
}

impl JiggleSettings {
    pub const DEFAULT_STIFFNESS: f32 = 0.2;
    pub const DEFAULT_DAMPEN: f32 = 0.2;
    pub const DEFAULT_AMPLITUDE: f32 = 30.0;
    pub const DEFAULT_STRETCH: f32 = 0.4;

    /// Enabled settings with default spring parameters.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Checks that the spring stays bounded: `stiffness`, `dampen` and `stretch` in `0..=1`
    /// and a finite `amplitude`.
    pub fn validate(&self) -> Result<(), crate::Error> {
        for (field, value) in [
            ("stiffness", self.stiffness),
            ("dampen", self.dampen),
            ("stretch", self.stretch),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(crate::Error::InvalidValue {
                    message: format!("jiggle {field} must be within 0..=1, got {value}"),
                });
            }
        }
        if !self.amplitude.is_finite() {
            return Err(crate::Error::InvalidValue {
                message: format!("jiggle amplitude must be finite, got {}", self.amplitude),
            });
        }
        Ok(())
    }
}

impl Default for JiggleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            animated: false,
            stiffness: Self::DEFAULT_STIFFNESS,
            dampen: Self::DEFAULT_DAMPEN,
            amplitude: Self::DEFAULT_AMPLITUDE,
            stretch: Self::DEFAULT_STRETCH,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum RotationMode {
    /// XYZ euler angles.
    Euler,
    #[default]
    Quaternion,
}

/// A bone's local rotation in the representation it is keyed in.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Rotation {
    /// XYZ euler angles in radians.
    Euler(Vec3),
    Quaternion(Quat),
}

impl Rotation {
    pub fn identity(mode: RotationMode) -> Self {
        match mode {
            RotationMode::Euler => Self::Euler(Vec3::ZERO),
            RotationMode::Quaternion => Self::Quaternion(Quat::IDENTITY),
        }
    }

    pub fn mode(&self) -> RotationMode {
        match self {
            Self::Euler(_) => RotationMode::Euler,
            Self::Quaternion(_) => RotationMode::Quaternion,
        }
    }

    pub fn to_quat(&self) -> Quat {
        match *self {
            Self::Euler(euler) => crate::quat_from_euler(euler),
            Self::Quaternion(q) => q,
        }
    }

    pub fn to_euler(&self) -> Vec3 {
        match *self {
            Self::Euler(euler) => euler,
            Self::Quaternion(q) => crate::euler_from_quat(q),
        }
    }

    /// Stores `euler` while keeping the current representation.
    pub fn set_euler(&mut self, euler: Vec3) {
        match self {
            Self::Euler(e) => *e = euler,
            Self::Quaternion(q) => *q = crate::quat_from_euler(euler),
        }
    }

    /// Stores `q` while keeping the current representation.
    pub fn set_quat(&mut self, q: Quat) {
        match self {
            Self::Euler(e) => *e = crate::euler_from_quat(q),
            Self::Quaternion(current) => *current = q.normalize(),
        }
    }

    /// Same orientation, converted to `mode`.
    pub fn with_mode(&self, mode: RotationMode) -> Self {
        match mode {
            RotationMode::Euler => Self::Euler(self.to_euler()),
            RotationMode::Quaternion => Self::Quaternion(self.to_quat()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BoneData {
    pub name: String,
    pub parent: Option<usize>,
    /// Offset of the bone's rest frame from its parent's frame (or the armature origin).
    pub head: Vec3,
    /// Rest orientation relative to the parent's frame.
    pub rest_rotation: Quat,
    /// Setup-pose local rotation; also fixes the bone's rotation representation.
    pub rotation: Rotation,
    pub jiggle: JiggleSettings,
}

impl BoneData {
    pub fn new(name: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent,
            head: Vec3::ZERO,
            rest_rotation: Quat::IDENTITY,
            rotation: Rotation::identity(RotationMode::default()),
            jiggle: JiggleSettings::default(),
        }
    }

    pub fn rotation_mode(&self) -> RotationMode {
        self.rotation.mode()
    }
}

#[derive(Clone, Debug)]
pub struct Vec3Frame {
    pub frame: f32,
    pub value: Vec3,
}

#[derive(Clone, Debug)]
pub struct QuatFrame {
    pub frame: f32,
    pub value: Quat,
}

#[derive(Clone, Debug)]
pub enum TrackChannel {
    Location(Vec<Vec3Frame>),
    /// XYZ euler angles in radians.
    RotationEuler(Vec<Vec3Frame>),
    RotationQuaternion(Vec<QuatFrame>),
    Scale(Vec<Vec3Frame>),
}

impl TrackChannel {
    pub fn is_rotation(&self) -> bool {
        matches!(self, Self::RotationEuler(_) | Self::RotationQuaternion(_))
    }

    pub(crate) fn frame_range(&self) -> Option<(f32, f32)> {
        fn range<T>(frames: &[T], frame: impl Fn(&T) -> f32) -> Option<(f32, f32)> {
            Some((frame(frames.first()?), frame(frames.last()?)))
        }
        match self {
            Self::Location(frames) | Self::RotationEuler(frames) | Self::Scale(frames) => {
                range(frames.as_slice(), |f: &Vec3Frame| f.frame)
            }
            Self::RotationQuaternion(frames) => range(frames.as_slice(), |f: &QuatFrame| f.frame),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BoneTrack {
    pub bone_index: usize,
    pub channel: TrackChannel,
}

/// Keyframed bone channels. Frames are sorted ascending within each channel.
#[derive(Clone, Debug)]
pub struct Action {
    pub name: String,
    pub tracks: Vec<BoneTrack>,
}

impl Action {
    /// First and last keyed frame over all tracks.
    pub fn frame_range(&self) -> Option<(f32, f32)> {
        self.tracks
            .iter()
            .filter_map(|t| t.channel.frame_range())
            .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))
    }

    /// Whether `bone_index` has rotation keys in this action.
    pub fn keys_rotation(&self, bone_index: usize) -> bool {
        self.tracks
            .iter()
            .any(|t| t.bone_index == bone_index && t.channel.is_rotation())
    }
}

/// Immutable armature setup data, shared between runtime instances.
#[derive(Clone, Debug)]
pub struct ArmatureData {
    pub name: String,
    /// Parents always precede their children.
    pub bones: Vec<BoneData>,
    pub actions: Vec<Action>,
    pub bone_index: HashMap<String, usize>,
    pub action_index: HashMap<String, usize>,
}

impl ArmatureData {
    pub fn new(
        name: impl Into<String>,
        bones: Vec<BoneData>,
        actions: Vec<Action>,
    ) -> Result<Arc<Self>, crate::Error> {
        let name = name.into();
        let mut bone_index = HashMap::with_capacity(bones.len());
        for (i, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent.filter(|&p| p >= i) {
                return Err(crate::Error::InvalidValue {
                    message: format!(
                        "bone '{}' in armature '{name}' must come after its parent (index {parent})",
                        bone.name
                    ),
                });
            }
            if bone_index.insert(bone.name.clone(), i).is_some() {
                return Err(crate::Error::InvalidValue {
                    message: format!("duplicate bone '{}' in armature '{name}'", bone.name),
                });
            }
        }

        for action in &actions {
            if let Some(track) = action.tracks.iter().find(|t| t.bone_index >= bones.len()) {
                return Err(crate::Error::InvalidValue {
                    message: format!(
                        "action '{}' references bone index {} out of {}",
                        action.name,
                        track.bone_index,
                        bones.len()
                    ),
                });
            }
        }

        let action_index = actions
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect::<HashMap<_, _>>();

        Ok(Arc::new(Self {
            name,
            bones,
            actions,
            bone_index,
            action_index,
        }))
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bone_index.get(name).copied()
    }

    pub fn action(&self, name: &str) -> Option<(usize, &Action)> {
        let index = *self.action_index.get(name)?;
        self.actions.get(index).map(|a| (index, a))
    }
}
