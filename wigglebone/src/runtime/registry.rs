use crate::{Armature, JiggleState};
use glam::Vec3;
use std::collections::{HashMap, HashSet};

/// Frame numbers a hook runs under.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameContext {
    pub current: i32,
    /// First frame of the playback range. Springs reset here.
    pub start: i32,
}

impl FrameContext {
    pub fn new(current: i32, start: i32) -> Self {
        Self { current, start }
    }

    pub fn is_start_frame(&self) -> bool {
        self.current == self.start
    }
}

#[derive(Clone, Debug)]
pub struct JiggleEntry {
    pub bone: String,
    pub state: JiggleState,
}

#[derive(Clone, Debug)]
pub struct ArmatureJiggles {
    pub armature: String,
    pub bones: Vec<JiggleEntry>,
}

/// Cached index of enabled jiggle bones, grouped by armature.
///
/// Entries are looked up by name on every hook call, so armature names must be unique. An entry
/// whose armature or bone can no longer be found is skipped until the next
/// [`JiggleRegistry::rebuild`].
#[derive(Clone, Debug, Default)]
pub struct JiggleRegistry {
    armatures: Vec<ArmatureJiggles>,
    /// Spring and velocity of disabled bones, keyed by `(armature, bone)`.
    dormant: HashMap<(String, String), (Vec3, Vec3)>,
    stability_limit: Option<f32>,
}

impl JiggleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt-in divergence guard: when a bone's spring or velocity magnitude exceeds `limit`
    /// (or stops being finite), its spring is zeroed and the frame's jiggle is not applied.
    pub fn with_stability_limit(mut self, limit: f32) -> Self {
        self.stability_limit = Some(limit);
        self
    }

    pub fn stability_limit(&self) -> Option<f32> {
        self.stability_limit
    }

    pub fn set_stability_limit(&mut self, limit: Option<f32>) {
        self.stability_limit = limit;
    }

    pub fn armatures(&self) -> &[ArmatureJiggles] {
        &self.armatures
    }

    pub fn len(&self) -> usize {
        self.armatures.iter().map(|a| a.bones.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self, armature: &str, bone: &str) -> Option<&JiggleState> {
        self.armatures
            .iter()
            .find(|a| a.armature == armature)?
            .bones
            .iter()
            .find(|b| b.bone == bone)
            .map(|b| &b.state)
    }

    pub fn clear(&mut self) {
        self.armatures.clear();
        self.dormant.clear();
    }

    /// Re-scans `armatures` for enabled bones.
    ///
    /// Every listed bone gets its reference matrix re-captured from its current pose. Spring and
    /// velocity are kept per bone for as long as the bone exists, including while it is
    /// disabled. Only the first armature with a given name is registered.
    pub fn rebuild(&mut self, armatures: &[Armature]) {
        let mut motion = std::mem::take(&mut self.dormant);
        for group in std::mem::take(&mut self.armatures) {
            for entry in group.bones {
                motion.insert(
                    (group.armature.clone(), entry.bone),
                    (entry.state.spring, entry.state.velocity),
                );
            }
        }

        let mut seen = HashSet::new();
        for armature in armatures {
            if !seen.insert(armature.name.as_str()) {
                log::warn!(
                    "jiggle: duplicate armature name '{}', later instance not registered",
                    armature.name
                );
                continue;
            }

            let mut bones = Vec::new();
            for bone in &armature.bones {
                let key = (armature.name.clone(), bone.name().to_string());
                let kept = motion.remove(&key);
                if !bone.jiggle.enabled {
                    if let Some(kept) = kept {
                        self.dormant.insert(key, kept);
                    }
                    continue;
                }
                let mut state = JiggleState::new(bone.matrix);
                if let Some((spring, velocity)) = kept {
                    state.spring = spring;
                    state.velocity = velocity;
                }
                log::debug!("jiggle: added {}/{}", armature.name, bone.name());
                bones.push(JiggleEntry { bone: key.1, state });
            }
            if !bones.is_empty() {
                self.armatures.push(ArmatureJiggles {
                    armature: armature.name.clone(),
                    bones,
                });
            }
        }

        log::debug!("jiggle: registry rebuilt with {} bones", self.len());
    }

    /// Steps non-animated bones. Runs before the pose is evaluated for the new frame.
    pub fn pre_pose(&mut self, armatures: &mut [Armature], frame: FrameContext) {
        let limit = self.stability_limit;
        self.for_each_present(armatures, |armature, bone_index, state| {
            let jiggle = armature.bones[bone_index].jiggle;
            if jiggle.enabled && !jiggle.animated {
                jiggle_bone(armature, bone_index, state, frame, limit);
            }
        });
    }

    /// Steps animated bones. Runs after the pose is evaluated for the new frame. On the start
    /// frame every enabled bone also re-captures its reference matrix here.
    pub fn post_pose(&mut self, armatures: &mut [Armature], frame: FrameContext) {
        let limit = self.stability_limit;
        self.for_each_present(armatures, |armature, bone_index, state| {
            let jiggle = armature.bones[bone_index].jiggle;
            if !jiggle.enabled {
                return;
            }
            if jiggle.animated {
                jiggle_bone(armature, bone_index, state, frame, limit);
            }
            if frame.is_start_frame() {
                state.reference = armature.bones[bone_index].matrix;
            }
        });
    }

    fn for_each_present(
        &mut self,
        armatures: &mut [Armature],
        mut f: impl FnMut(&mut Armature, usize, &mut JiggleState),
    ) {
        for group in &mut self.armatures {
            let Some(armature) = armatures.iter_mut().find(|a| a.name == group.armature) else {
                log::trace!("jiggle: armature '{}' not found, skipping", group.armature);
                continue;
            };
            for entry in &mut group.bones {
                let Some(bone_index) = armature.find_bone(&entry.bone) else {
                    log::trace!(
                        "jiggle: bone '{}' not found in '{}', skipping",
                        entry.bone,
                        group.armature
                    );
                    continue;
                };
                f(armature, bone_index, &mut entry.state);
            }
        }
    }
}

fn jiggle_bone(
    armature: &mut Armature,
    bone_index: usize,
    state: &mut JiggleState,
    frame: FrameContext,
    stability_limit: Option<f32>,
) {
    let Some(sample) = armature.sample(bone_index) else {
        return;
    };
    let bone = &mut armature.bones[bone_index];
    let output = state.step(&bone.jiggle, &sample, frame.is_start_frame());

    if let Some(limit) = stability_limit {
        let diverged = !state.is_finite()
            || state.spring.length() > limit
            || state.velocity.length() > limit;
        if diverged {
            log::warn!(
                "jiggle: bone '{}' in '{}' exceeded stability limit {limit} at frame {}, resetting",
                bone.name(),
                armature.name,
                frame.current
            );
            state.reset_motion();
            return;
        }
    }

    bone.apply_jiggle(&output);
}
