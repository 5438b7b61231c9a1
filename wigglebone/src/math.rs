//! Rotation conventions shared by the armature model and the integrator.
//!
//! Euler angles are XYZ: the X rotation is applied first, then Y, then Z (`R = Rz · Ry · Rx`).

use glam::{EulerRot, Mat4, Quat, Vec3};

pub fn quat_from_euler(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::ZYX, euler.z, euler.y, euler.x)
}

pub fn euler_from_quat(q: Quat) -> Vec3 {
    let (z, y, x) = q.normalize().to_euler(EulerRot::ZYX);
    Vec3::new(x, y, z)
}

/// Rotation part of `m` with scale removed.
pub fn matrix_rotation(m: &Mat4) -> Quat {
    let (_, rotation, _) = m.to_scale_rotation_translation();
    rotation
}

/// Translation of `current` measured in the frame of `previous`, with the relative rotation
/// between the two undone so that a bone turning in place does not register as movement.
pub fn relative_vector(previous: &Mat4, current: &Mat4) -> Vec3 {
    let delta = previous.inverse() * *current;
    let (_, rotation, translation) = delta.to_scale_rotation_translation();
    rotation.inverse() * translation
}
