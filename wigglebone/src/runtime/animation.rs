use crate::{Action, Armature, QuatFrame, TrackChannel, Vec3Frame};
use glam::{Quat, Vec3};

/// Poses `armature` with `action` sampled at `frame`. Frames before the first key hold the
/// first key; frames after the last key hold the last key.
pub fn apply_action(action: &Action, armature: &mut Armature, frame: f32) {
    for track in &action.tracks {
        let Some(bone) = armature.bones.get_mut(track.bone_index) else {
            continue;
        };
        match &track.channel {
            TrackChannel::Location(frames) => {
                if let Some(v) = sample_vec3(frames, frame) {
                    bone.location = v;
                }
            }
            TrackChannel::RotationEuler(frames) => {
                if let Some(v) = sample_vec3(frames, frame) {
                    bone.rotation.set_euler(v);
                }
            }
            TrackChannel::RotationQuaternion(frames) => {
                if let Some(q) = sample_quat(frames, frame) {
                    bone.rotation.set_quat(q);
                }
            }
            TrackChannel::Scale(frames) => {
                if let Some(v) = sample_vec3(frames, frame) {
                    bone.scale = v;
                }
            }
        }
    }
}

fn sample_vec3(frames: &[Vec3Frame], frame: f32) -> Option<Vec3> {
    let index = frames.partition_point(|f| f.frame <= frame);
    if index == 0 {
        return frames.first().map(|f| f.value);
    }
    if index >= frames.len() {
        return frames.last().map(|f| f.value);
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    Some(prev.value.lerp(next.value, blend(frame, prev.frame, next.frame)))
}

fn sample_quat(frames: &[QuatFrame], frame: f32) -> Option<Quat> {
    let index = frames.partition_point(|f| f.frame <= frame);
    if index == 0 {
        return frames.first().map(|f| f.value);
    }
    if index >= frames.len() {
        return frames.last().map(|f| f.value);
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    Some(prev.value.slerp(next.value, blend(frame, prev.frame, next.frame)))
}

fn blend(frame: f32, frame1: f32, frame2: f32) -> f32 {
    let denom = frame2 - frame1;
    if denom.abs() <= 1.0e-12 {
        return 1.0;
    }
    (frame - frame1) / denom
}
