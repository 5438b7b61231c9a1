use crate::{Armature, FrameContext, JiggleRegistry, JiggleSettings};

/// A set of armatures driven through frame changes.
///
/// A frame change runs the pre-pose jiggle hook, samples each armature's active action,
/// evaluates matrices, runs the post-pose hook, then evaluates matrices again so the jiggle
/// is visible in the final pose.
#[derive(Clone, Debug)]
pub struct Scene {
    pub armatures: Vec<Armature>,
    pub frame_start: i32,
    pub frame_end: i32,
    frame_current: i32,
    registry: JiggleRegistry,
}

impl Scene {
    /// Armature names must be unique; the jiggle registry finds armatures by name.
    pub fn new(
        armatures: Vec<Armature>,
        frame_start: i32,
        frame_end: i32,
    ) -> Result<Self, crate::Error> {
        for (i, armature) in armatures.iter().enumerate() {
            if armatures[..i].iter().any(|a| a.name == armature.name) {
                return Err(crate::Error::DuplicateArmature {
                    name: armature.name.clone(),
                });
            }
        }

        let mut out = Self {
            armatures,
            frame_start,
            frame_end,
            frame_current: frame_start,
            registry: JiggleRegistry::new(),
        };
        out.registry.rebuild(&out.armatures);
        Ok(out)
    }

    pub fn frame_current(&self) -> i32 {
        self.frame_current
    }

    pub fn registry(&self) -> &JiggleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut JiggleRegistry {
        &mut self.registry
    }

    pub fn armature(&self, name: &str) -> Option<&Armature> {
        self.armatures.iter().find(|a| a.name == name)
    }

    pub fn armature_mut(&mut self, name: &str) -> Option<&mut Armature> {
        self.armatures.iter_mut().find(|a| a.name == name)
    }

    /// Adds an armature and rebuilds the jiggle index. Another instance of the same
    /// [`crate::ArmatureData`] needs its own `name` first.
    pub fn add_armature(&mut self, armature: Armature) -> Result<(), crate::Error> {
        if self.armature(&armature.name).is_some() {
            return Err(crate::Error::DuplicateArmature {
                name: armature.name,
            });
        }
        self.armatures.push(armature);
        self.registry.rebuild(&self.armatures);
        Ok(())
    }

    /// Removes an armature. The jiggle index is left as is; its entries for the removed
    /// armature are skipped.
    pub fn remove_armature(&mut self, name: &str) -> Option<Armature> {
        let index = self.armatures.iter().position(|a| a.name == name)?;
        Some(self.armatures.remove(index))
    }

    /// Toggles a bone's jiggle and rebuilds the jiggle index.
    pub fn set_jiggle_enabled(
        &mut self,
        armature: &str,
        bone: &str,
        enabled: bool,
    ) -> Result<(), crate::Error> {
        self.jiggle_settings_mut(armature, bone)?.enabled = enabled;
        self.registry.rebuild(&self.armatures);
        Ok(())
    }

    /// Settings of one bone. Changing `enabled` through this does not rebuild the index; use
    /// [`Scene::set_jiggle_enabled`] for that.
    pub fn jiggle_settings_mut(
        &mut self,
        armature: &str,
        bone: &str,
    ) -> Result<&mut JiggleSettings, crate::Error> {
        let arm = self
            .armature_mut(armature)
            .ok_or_else(|| crate::Error::UnknownArmature {
                name: armature.to_string(),
            })?;
        let arm_name = arm.name.clone();
        arm.bone_mut(bone)
            .map(|b| &mut b.jiggle)
            .ok_or_else(|| crate::Error::UnknownBone {
                armature: arm_name,
                bone: bone.to_string(),
            })
    }

    pub fn set_active_action(
        &mut self,
        armature: &str,
        action: Option<&str>,
    ) -> Result<(), crate::Error> {
        self.armature_mut(armature)
            .ok_or_else(|| crate::Error::UnknownArmature {
                name: armature.to_string(),
            })?
            .set_active_action(action)
    }

    pub fn frame_set(&mut self, frame: i32) {
        self.frame_current = frame;
        let context = FrameContext::new(frame, self.frame_start);

        self.registry.pre_pose(&mut self.armatures, context);
        for armature in &mut self.armatures {
            armature.apply_active_action(frame as f32);
            armature.update_world_transform();
        }

        self.registry.post_pose(&mut self.armatures, context);
        for armature in &mut self.armatures {
            armature.update_world_transform();
        }
    }

    /// Plays `frame_start..=frame_end`, calling `on_frame` after each frame change.
    pub fn play(&mut self, mut on_frame: impl FnMut(&Scene)) {
        for frame in self.frame_start..=self.frame_end {
            self.frame_set(frame);
            on_frame(self);
        }
    }
}
