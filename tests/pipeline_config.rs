use std::sync::Mutex;

use tempfile::NamedTempFile;

use liveclass::{CameraFacing, PipelineConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "LIVECLASS_CONFIG",
        "LIVECLASS_CAMERA_DEVICE",
        "LIVECLASS_CAMERA_FACING",
        "LIVECLASS_TOP_K",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let toml = r#"
        [camera]
        device = "stub://lab_bench"
        facing = "front"
        target_fps = 24
        width = 320
        height = 240
        rotation_degrees = 270.0

        [analysis]
        top_k = 3

        [labels]
        smile = "Smiling"
        "no face" = "No face"
        frown = "Frowning"
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");

    std::env::set_var("LIVECLASS_CONFIG", file.path());
    std::env::set_var("LIVECLASS_CAMERA_FACING", "back");
    std::env::set_var("LIVECLASS_TOP_K", "2");

    let cfg = PipelineConfig::load().expect("load config");

    assert_eq!(cfg.camera.device, "stub://lab_bench");
    assert_eq!(cfg.camera.facing, CameraFacing::Back);
    assert_eq!(cfg.camera.target_fps, 24);
    assert_eq!(cfg.camera.width, 320);
    assert_eq!(cfg.camera.height, 240);
    assert_eq!(cfg.camera.rotation_degrees, 270.0);
    assert_eq!(cfg.top_k, 2);
    assert_eq!(cfg.labels.len(), 3);
    assert_eq!(cfg.labels["frown"], "Frowning");

    clear_env();
}

#[test]
fn defaults_apply_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = PipelineConfig::load().expect("load config");

    assert_eq!(cfg.camera.device, "stub://camera");
    assert_eq!(cfg.camera.facing, CameraFacing::Back);
    assert_eq!((cfg.camera.width, cfg.camera.height), (224, 224));
    assert_eq!(cfg.top_k, 1);
    assert_eq!(cfg.labels["smile"], "Smiling");
    assert_eq!(cfg.labels["no face"], "No face");
}

#[test]
fn invalid_facing_override_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("LIVECLASS_CAMERA_FACING", "sideways");
    let result = PipelineConfig::load();
    clear_env();

    assert!(result.is_err());
}

#[test]
fn zero_resolution_fails_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let toml = r#"
        [camera]
        width = 0
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");
    std::env::set_var("LIVECLASS_CONFIG", file.path());

    let result = PipelineConfig::load();
    clear_env();

    assert!(result.is_err());
}
