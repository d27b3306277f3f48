// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use quick_scan::{AppError, Config, Orientation, SensorFacing};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("quick-scan-{}-{}", std::process::id(), name))
}

#[test]
fn test_config_default() {
    let config = Config::default();

    // Check sensible defaults
    assert_eq!(config.sensor_facing, SensorFacing::Back);
    assert_eq!(config.device_orientation(), Orientation::Deg0);
    assert!(config.loop_frames, "Still images should loop by default");
}

#[test]
fn test_missing_file_yields_defaults() {
    let config = Config::load_from(&temp_path("does-not-exist.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load() {
    let path = temp_path("roundtrip").join("config.json");
    let config = Config {
        device_rotation: 90,
        sensor_mount_angle: 270,
        sensor_facing: SensorFacing::Front,
        ..Config::default()
    };

    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_malformed_file_is_config_error() {
    let path = temp_path("malformed.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = Config::load_from(&path);
    assert!(
        matches!(result, Err(AppError::Config(_))),
        "Malformed config should be reported as a config error"
    );

    let _ = std::fs::remove_file(&path);
}
