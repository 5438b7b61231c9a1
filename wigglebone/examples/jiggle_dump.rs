use serde_json::json;
use std::path::PathBuf;
use wigglebone::Scene;

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut positional = Vec::<String>::new();
    let mut stability_limit: Option<f32> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--stability-limit" => {
                stability_limit = args.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let json_path = positional.first().map(PathBuf::from).unwrap_or_else(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/pendulum.json")
    });

    let json = std::fs::read_to_string(&json_path).expect("read json");
    let mut scene = Scene::from_json_str(&json).expect("parse scene");
    scene.registry_mut().set_stability_limit(stability_limit);

    let mut frames = Vec::new();
    scene.play(|scene| {
        let armatures: Vec<_> = scene
            .armatures
            .iter()
            .map(|armature| {
                let bones: Vec<_> = armature
                    .bones
                    .iter()
                    .enumerate()
                    .filter(|(_, bone)| bone.jiggle.enabled)
                    .map(|(i, bone)| {
                        let rotation = bone.rotation.to_euler();
                        let head = bone.matrix.w_axis;
                        json!({
                            "i": i,
                            "name": bone.name(),
                            "rotation": [
                                rotation.x.to_degrees(),
                                rotation.y.to_degrees(),
                                rotation.z.to_degrees(),
                            ],
                            "scaleY": bone.scale.y,
                            "head": [head.x, head.y, head.z],
                        })
                    })
                    .collect();
                json!({"name": armature.name, "bones": bones})
            })
            .collect();
        frames.push(json!({"frame": scene.frame_current(), "armatures": armatures}));
    });

    let out = json!({
        "frameStart": scene.frame_start,
        "frameEnd": scene.frame_end,
        "frames": frames,
    });
    println!("{}", serde_json::to_string_pretty(&out).expect("serialize"));
}
