use crate::{ArmatureData, JiggleOutput, JiggleSettings, Rotation};
use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct PoseBone {
    data_index: usize,
    parent: Option<usize>,
    name: String,

    pub location: Vec3,
    pub rotation: Rotation,
    pub scale: Vec3,
    pub jiggle: JiggleSettings,

    /// Armature-space matrix from the last `update_world_transform`.
    pub matrix: Mat4,
}

impl PoseBone {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Writes the integrator's rotation (in the bone's own representation) and Y scale.
    pub fn apply_jiggle(&mut self, output: &JiggleOutput) {
        self.rotation.set_euler(output.rotation);
        self.scale.y = output.scale_y;
    }

    fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation.to_quat(), self.location)
    }
}

/// Runtime pose of an armature.
#[derive(Clone, Debug)]
pub struct Armature {
    pub data: Arc<ArmatureData>,
    /// Object name; the jiggle registry keys entries by it.
    pub name: String,
    pub bones: Vec<PoseBone>,
    bone_index: HashMap<String, usize>,
    active_action: Option<usize>,
}

impl Armature {
    pub fn new(data: Arc<ArmatureData>) -> Self {
        let bones = data
            .bones
            .iter()
            .enumerate()
            .map(|(i, b)| PoseBone {
                data_index: i,
                parent: b.parent,
                name: b.name.clone(),
                location: Vec3::ZERO,
                rotation: b.rotation,
                scale: Vec3::ONE,
                jiggle: b.jiggle,
                matrix: Mat4::IDENTITY,
            })
            .collect::<Vec<_>>();

        let mut out = Self {
            name: data.name.clone(),
            bone_index: data.bone_index.clone(),
            data,
            bones,
            active_action: None,
        };
        out.update_world_transform();
        out
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bone_index.get(name).copied()
    }

    pub fn bone(&self, name: &str) -> Option<&PoseBone> {
        self.find_bone(name).and_then(|i| self.bones.get(i))
    }

    pub fn bone_mut(&mut self, name: &str) -> Option<&mut PoseBone> {
        let index = self.find_bone(name)?;
        self.bones.get_mut(index)
    }

    /// Renames a pose bone. Registry entries holding the old name go stale until the next
    /// rebuild.
    pub fn rename_bone(&mut self, from: &str, to: &str) -> Result<(), crate::Error> {
        let index = self
            .find_bone(from)
            .ok_or_else(|| crate::Error::UnknownBone {
                armature: self.name.clone(),
                bone: from.to_string(),
            })?;
        if from != to && self.bone_index.contains_key(to) {
            return Err(crate::Error::InvalidValue {
                message: format!("bone '{to}' already exists in armature '{}'", self.name),
            });
        }
        self.bone_index.remove(from);
        self.bone_index.insert(to.to_string(), index);
        self.bones[index].name = to.to_string();
        Ok(())
    }

    pub fn active_action(&self) -> Option<usize> {
        self.active_action
    }

    pub fn set_active_action(&mut self, name: Option<&str>) -> Result<(), crate::Error> {
        self.active_action = match name {
            None => None,
            Some(name) => Some(
                self.data
                    .action(name)
                    .map(|(i, _)| i)
                    .ok_or_else(|| crate::Error::UnknownAction {
                        name: name.to_string(),
                    })?,
            ),
        };
        Ok(())
    }

    /// Samples the active action at `frame` into the pose. Does not update matrices.
    pub fn apply_active_action(&mut self, frame: f32) {
        let data = self.data.clone();
        if let Some(action) = self.active_action.and_then(|i| data.actions.get(i)) {
            crate::apply_action(action, self, frame);
        }
    }

    pub fn set_to_setup_pose(&mut self) {
        for bone in &mut self.bones {
            let Some(data) = self.data.bones.get(bone.data_index) else {
                continue;
            };
            bone.location = Vec3::ZERO;
            bone.rotation = data.rotation;
            bone.scale = Vec3::ONE;
        }
    }

    /// Recomputes every bone matrix, parents first.
    pub fn update_world_transform(&mut self) {
        for i in 0..self.bones.len() {
            let matrix = self.local_space_matrix(i) * self.bones[i].local_matrix();
            self.bones[i].matrix = matrix;
        }
    }

    /// The frame a bone's local pose channels are expressed in: the parent's current matrix
    /// times the bone's rest offset.
    pub fn local_space_matrix(&self, bone_index: usize) -> Mat4 {
        let Some(data) = self.data.bones.get(bone_index) else {
            return Mat4::IDENTITY;
        };
        let parent = self.bones[bone_index]
            .parent
            .and_then(|p| self.bones.get(p))
            .map(|p| p.matrix)
            .unwrap_or(Mat4::IDENTITY);
        parent * Mat4::from_rotation_translation(data.rest_rotation, data.head)
    }

    pub fn sample(&self, bone_index: usize) -> Option<crate::BoneSample> {
        let bone = self.bones.get(bone_index)?;
        Some(crate::BoneSample {
            matrix: bone.matrix,
            local_space: self.local_space_matrix(bone_index),
            rotation: bone.rotation.to_euler(),
        })
    }
}
