use crate::{
    Action, Armature, ArmatureData, BoneData, BoneTrack, JiggleSettings, Rotation, RotationMode,
    Scene, TrackChannel, Vec3Frame,
};
use glam::Vec3;
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn keys(keys: &[(f32, Vec3)]) -> Vec<Vec3Frame> {
    keys.iter()
        .map(|&(frame, value)| Vec3Frame { frame, value })
        .collect()
}

/// Setup data for a root that slides along X (and later Z) with a non-animated "bob" hanging below it and an
/// animated "flap" keyed around X.
fn pendulum_data(bob_mode: RotationMode) -> Arc<ArmatureData> {
    let root = BoneData::new("root", None);
    let bob = BoneData {
        head: Vec3::Y,
        rotation: Rotation::identity(bob_mode),
        jiggle: JiggleSettings::enabled(),
        ..BoneData::new("bob", Some(0))
    };
    let flap = BoneData {
        head: Vec3::Y,
        rotation: Rotation::identity(RotationMode::Euler),
        jiggle: JiggleSettings {
            animated: true,
            ..JiggleSettings::enabled()
        },
        ..BoneData::new("flap", Some(0))
    };
    let action = Action {
        name: "swing".to_string(),
        tracks: vec![
            BoneTrack {
                bone_index: 0,
                channel: TrackChannel::Location(keys(&[
                    (1.0, Vec3::ZERO),
                    (2.0, Vec3::X),
                    (8.0, Vec3::new(-0.5, 0.0, 0.75)),
                    (14.0, Vec3::ZERO),
                ])),
            },
            BoneTrack {
                bone_index: 2,
                channel: TrackChannel::RotationEuler(keys(&[
                    (1.0, Vec3::ZERO),
                    (2.0, Vec3::new(10f32.to_radians(), 0.0, 0.0)),
                ])),
            },
        ],
    };

    ArmatureData::new("rig", vec![root, bob, flap], vec![action]).expect("data")
}

fn swinging(data: &Arc<ArmatureData>) -> Armature {
    let mut armature = Armature::new(data.clone());
    armature.set_active_action(Some("swing")).expect("action");
    armature
}

fn pendulum(bob_mode: RotationMode) -> Scene {
    Scene::new(vec![swinging(&pendulum_data(bob_mode))], 1, 20).expect("scene")
}

fn bob(scene: &Scene) -> &crate::PoseBone {
    scene
        .armature("rig")
        .and_then(|a| a.bone("bob"))
        .expect("bob")
}

#[test]
fn start_frame_pose_has_no_jiggle() {
    let mut scene = pendulum(RotationMode::Euler);
    scene.frame_set(1);

    let bob = bob(&scene);
    assert_eq!(bob.rotation.to_euler(), Vec3::ZERO);
    assert_approx(bob.scale.y, 1.0);
    let state = scene.registry().state("rig", "bob").expect("state");
    assert_eq!(state.reference, bob.matrix);
}

#[test]
fn parent_slide_swings_bob_one_frame_later() {
    let mut scene = pendulum(RotationMode::Euler);
    scene.frame_set(1);
    scene.frame_set(2);
    // The pre-pose hook still sees frame 1's pose.
    assert_eq!(bob(&scene).rotation.to_euler(), Vec3::ZERO);

    scene.frame_set(3);
    let rotation = bob(&scene).rotation.to_euler();
    assert_approx(rotation.x, 0.0);
    assert_approx(rotation.z, 30f32.to_radians());
    assert_approx(bob(&scene).scale.y, 1.0);
}

#[test]
fn keyed_rotation_excites_animated_bone() {
    let mut scene = pendulum(RotationMode::Euler);
    scene.frame_set(1);
    let flap = scene.armature("rig").and_then(|a| a.bone("flap")).expect("flap");
    assert_eq!(flap.rotation.to_euler(), Vec3::ZERO);

    scene.frame_set(2);
    let flap = scene.armature("rig").and_then(|a| a.bone("flap")).expect("flap");
    // Keyed swing around X feeds tension Z; the root sliding one unit along X feeds tension X.
    let keyed = 10f32.to_radians();
    let rotation = flap.rotation.to_euler();
    assert_approx(rotation.x, keyed + (-keyed * 30.0).to_radians());
    assert_approx(rotation.z, 30f32.to_radians());
}

#[test]
fn euler_and_quaternion_bones_jiggle_alike() {
    let mut euler = pendulum(RotationMode::Euler);
    let mut quat = pendulum(RotationMode::Quaternion);

    for frame in 1..=20 {
        euler.frame_set(frame);
        quat.frame_set(frame);

        let a = bob(&euler);
        let b = bob(&quat);
        assert_eq!(a.rotation.mode(), RotationMode::Euler);
        assert_eq!(b.rotation.mode(), RotationMode::Quaternion);
        let dot = a.rotation.to_quat().dot(b.rotation.to_quat()).abs();
        assert!(dot > 1.0 - 1.0e-5, "frame {frame}: dot {dot}");
        assert_approx(a.scale.y, b.scale.y);
    }
}

#[test]
fn returning_to_start_frame_resets_springs() {
    let mut scene = pendulum(RotationMode::Quaternion);
    for frame in 1..=10 {
        scene.frame_set(frame);
    }
    assert_ne!(
        scene.registry().state("rig", "bob").expect("bob").spring,
        Vec3::ZERO
    );

    scene.frame_set(1);
    let state = scene.registry().state("rig", "bob").expect("bob");
    assert_eq!(state.spring, Vec3::ZERO);
    assert_eq!(state.velocity, Vec3::ZERO);
    let bob = bob(&scene);
    assert!(bob.rotation.to_quat().dot(glam::Quat::IDENTITY).abs() > 1.0 - 1.0e-6);
    assert_approx(bob.scale.y, 1.0);
}

#[test]
fn replaying_is_deterministic() {
    let mut scene = pendulum(RotationMode::Euler);
    let mut first = Vec::new();
    scene.play(|s| first.push(bob(s).rotation.to_euler()));

    // Scrub somewhere else, then play again from the start.
    scene.frame_set(17);
    scene.frame_set(5);
    let mut second = Vec::new();
    scene.play(|s| second.push(bob(s).rotation.to_euler()));

    assert_eq!(first.len(), 20);
    assert_eq!(first, second);
}

#[test]
fn toggling_jiggle_rebuilds_index() {
    let mut scene = pendulum(RotationMode::Euler);
    assert_eq!(scene.registry().len(), 2);

    scene.set_jiggle_enabled("rig", "bob", false).expect("toggle");
    assert_eq!(scene.registry().len(), 1);
    assert!(scene.registry().state("rig", "bob").is_none());

    scene.set_jiggle_enabled("rig", "root", true).expect("toggle");
    assert!(scene.registry().state("rig", "root").is_some());

    assert!(matches!(
        scene.set_jiggle_enabled("rig", "nope", true),
        Err(crate::Error::UnknownBone { .. })
    ));
    assert!(matches!(
        scene.set_jiggle_enabled("other", "bob", true),
        Err(crate::Error::UnknownArmature { .. })
    ));
}

#[test]
fn jiggle_state_survives_disable_and_enable() {
    let mut scene = pendulum(RotationMode::Euler);
    for frame in 1..=3 {
        scene.frame_set(frame);
    }
    let before = *scene.registry().state("rig", "bob").expect("bob");
    assert_ne!(before.spring, Vec3::ZERO);

    scene.set_jiggle_enabled("rig", "bob", false).expect("disable");
    assert!(scene.registry().state("rig", "bob").is_none());
    scene.set_jiggle_enabled("rig", "bob", true).expect("enable");

    let after = scene.registry().state("rig", "bob").expect("bob");
    assert_eq!(after.spring, before.spring);
    assert_eq!(after.velocity, before.velocity);
    assert_eq!(after.reference, bob(&scene).matrix);
}

#[test]
fn instances_of_shared_data_jiggle_independently() {
    let data = pendulum_data(RotationMode::Euler);
    assert!(matches!(
        Scene::new(vec![swinging(&data), swinging(&data)], 1, 20),
        Err(crate::Error::DuplicateArmature { ref name }) if name == "rig"
    ));

    let mut copy = swinging(&data);
    copy.name = "rig.001".to_string();
    let mut scene = Scene::new(vec![swinging(&data), copy], 1, 20).expect("scene");
    assert_eq!(scene.registry().armatures().len(), 2);
    assert_eq!(scene.registry().len(), 4);

    for frame in 1..=6 {
        scene.frame_set(frame);
        let first = scene.armature("rig").and_then(|a| a.bone("bob")).expect("bob");
        let second = scene.armature("rig.001").and_then(|a| a.bone("bob")).expect("bob");
        assert_eq!(first.rotation, second.rotation, "frame {frame}");
        assert_eq!(first.scale, second.scale, "frame {frame}");
        if frame == 3 {
            assert_approx(second.rotation.to_euler().z, 30f32.to_radians());
        }
    }

    assert!(matches!(
        scene.add_armature(swinging(&data)),
        Err(crate::Error::DuplicateArmature { .. })
    ));
    assert_eq!(scene.armatures.len(), 2);
}

#[test]
fn removed_armature_is_skipped() {
    let mut scene = pendulum(RotationMode::Euler);
    scene.frame_set(1);
    assert!(scene.remove_armature("rig").is_some());
    assert_eq!(scene.registry().len(), 2);

    scene.frame_set(2);
    assert_eq!(scene.frame_current(), 2);
    assert!(scene.armature("rig").is_none());
}
