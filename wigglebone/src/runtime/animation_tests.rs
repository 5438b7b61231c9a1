use crate::{
    Action, Armature, ArmatureData, BoneData, BoneTrack, QuatFrame, Rotation, RotationMode,
    TrackChannel, Vec3Frame, apply_action,
};
use glam::{Quat, Vec3};

fn assert_vec_approx(actual: Vec3, expected: Vec3) {
    let diff = (actual - expected).abs().max_element();
    assert!(
        diff <= 1.0e-5,
        "expected {expected:?}, got {actual:?} (diff {diff})"
    );
}

fn armature_with(action: Action, mode: RotationMode) -> Armature {
    let bone = BoneData {
        rotation: Rotation::identity(mode),
        ..BoneData::new("root", None)
    };
    Armature::new(ArmatureData::new("rig", vec![bone], vec![action]).expect("armature data"))
}

fn slide() -> Action {
    Action {
        name: "slide".to_string(),
        tracks: vec![BoneTrack {
            bone_index: 0,
            channel: TrackChannel::Location(vec![
                Vec3Frame {
                    frame: 1.0,
                    value: Vec3::ZERO,
                },
                Vec3Frame {
                    frame: 11.0,
                    value: Vec3::new(10.0, 0.0, -5.0),
                },
            ]),
        }],
    }
}

#[test]
fn location_interpolates_and_holds_ends() {
    let action = slide();
    let mut armature = armature_with(action.clone(), RotationMode::Quaternion);

    apply_action(&action, &mut armature, 6.0);
    assert_vec_approx(armature.bones[0].location, Vec3::new(5.0, 0.0, -2.5));

    apply_action(&action, &mut armature, -3.0);
    assert_vec_approx(armature.bones[0].location, Vec3::ZERO);

    apply_action(&action, &mut armature, 40.0);
    assert_vec_approx(armature.bones[0].location, Vec3::new(10.0, 0.0, -5.0));
}

#[test]
fn active_action_drives_pose() {
    let mut armature = armature_with(slide(), RotationMode::Quaternion);
    armature.set_active_action(Some("slide")).expect("action");
    armature.apply_active_action(3.0);
    armature.update_world_transform();

    assert_vec_approx(
        armature.bones[0].matrix.w_axis.truncate(),
        Vec3::new(2.0, 0.0, -1.0),
    );
}

#[test]
fn quaternion_keys_land_in_euler_bone() {
    let turn = Quat::from_rotation_z(1.0);
    let action = Action {
        name: "turn".to_string(),
        tracks: vec![BoneTrack {
            bone_index: 0,
            channel: TrackChannel::RotationQuaternion(vec![
                QuatFrame {
                    frame: 0.0,
                    value: Quat::IDENTITY,
                },
                QuatFrame {
                    frame: 2.0,
                    value: turn,
                },
            ]),
        }],
    };
    let mut armature = armature_with(action.clone(), RotationMode::Euler);

    apply_action(&action, &mut armature, 1.0);
    let Rotation::Euler(euler) = armature.bones[0].rotation else {
        panic!("expected euler rotation");
    };
    assert_vec_approx(euler, Vec3::new(0.0, 0.0, 0.5));
}

#[test]
fn action_reports_range_and_rotation_keys() {
    let mut action = slide();
    assert_eq!(action.frame_range(), Some((1.0, 11.0)));
    assert!(!action.keys_rotation(0));

    action.tracks.push(BoneTrack {
        bone_index: 0,
        channel: TrackChannel::RotationEuler(vec![Vec3Frame {
            frame: 20.0,
            value: Vec3::X,
        }]),
    });
    assert_eq!(action.frame_range(), Some((1.0, 20.0)));
    assert!(action.keys_rotation(0));
    assert!(!action.keys_rotation(1));
}
