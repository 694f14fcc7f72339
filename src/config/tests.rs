//! Unit tests for configuration module
//!
//! Tests configuration parsing, validation, serialization/deserialization,
//! and edge cases in configuration handling.

use super::*;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_configuration_is_valid() {
    let config = ViewConfig::default();

    assert!(config.validate().is_ok());
    assert!(config.occlusion.enabled);
    assert!(config.occlusion.opaque_full_blocks);
    assert_eq!(config.occlusion.inflate_width, 80.0);
    assert_eq!(config.occlusion.inflate_height, 160.0);
    assert_eq!(config.mask.default_opacity, 0.8);
    assert_eq!(config.tween.duration(), Duration::from_millis(220));
    assert_eq!(config.tween.curve, "ease-out");
}

#[test]
fn test_configuration_serialization_roundtrip() -> Result<()> {
    let original_config = ViewConfig::default();

    let toml_string = toml::to_string(&original_config)?;
    let deserialized_config: ViewConfig = toml::from_str(&toml_string)?;

    assert_eq!(original_config, deserialized_config);

    Ok(())
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("test_config.toml");

    let test_config = r#"
[stage]
width = 1920
height = 1080

[occlusion]
enabled = true
opaque_full_blocks = false
inflate_width = 40
inflate_height = 40

[mask]
default_opacity = 0.5

[tween]
enabled = true
duration_ms = 300
curve = "ease-in-out"
start_scale = 0.5

[loading]
max_duration_ms = 5000
"#;

    fs::write(&file_path, test_config)?;

    let config = ViewConfig::load(&file_path)?;

    assert_eq!(config.stage.width, 1920.0);
    assert!(!config.occlusion.opaque_full_blocks);
    assert_eq!(config.occlusion.inflation(), Vector2::new(40.0, 40.0));
    assert_eq!(config.mask.default_opacity, 0.5);
    assert_eq!(config.tween.curve, "ease-in-out");
    assert_eq!(config.loading.max_duration(), Duration::from_secs(5));

    Ok(())
}

#[test]
fn test_partial_file_keeps_defaults() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("partial_config.toml");

    fs::write(&file_path, "[mask]\ndefault_opacity = 0.3\n")?;

    let config = ViewConfig::load(&file_path)?;

    assert_eq!(config.mask.default_opacity, 0.3);
    assert_eq!(config.occlusion, OcclusionConfig::default());
    assert_eq!(config.tween, TweenConfig::default());

    Ok(())
}

#[test]
fn test_malformed_toml_handling() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("malformed_config.toml");

    let malformed_config = r#"
[occlusion
enabled = true

[stage]
width = "wide"
"#;

    fs::write(&file_path, malformed_config).unwrap();

    assert!(ViewConfig::load(&file_path).is_err());
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempdir().unwrap();
    assert!(ViewConfig::load(dir.path().join("nope.toml")).is_err());
}

#[test]
fn test_configuration_validation() {
    let config = ViewConfig::default();

    let mut invalid = config.clone();
    invalid.mask.default_opacity = 1.5;
    assert!(invalid.validate().is_err());

    let mut invalid = config.clone();
    invalid.tween.curve = "bounce".to_string();
    assert!(invalid.validate().is_err());

    let mut invalid = config.clone();
    invalid.tween.duration_ms = 0;
    assert!(invalid.validate().is_err());

    // A zero duration is fine once tweens are off
    invalid.tween.enabled = false;
    assert!(invalid.validate().is_ok());

    let mut invalid = config.clone();
    invalid.stage.height = 0.0;
    assert!(invalid.validate().is_err());

    let mut invalid = config;
    invalid.occlusion.inflate_width = -1.0;
    assert!(invalid.validate().is_err());
}

#[test]
fn test_save_and_reload() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("saved.toml");

    let mut config = ViewConfig::default();
    config.tween.duration_ms = 500;
    config.save(&file_path)?;

    let reloaded = ViewConfig::load(&file_path)?;
    assert_eq!(reloaded.tween.duration_ms, 500);
    assert_eq!(reloaded, config);

    Ok(())
}

#[test]
fn test_merge_partial_overrides_changed_sections() {
    let mut base = ViewConfig::default();
    base.stage.width = 2048.0;

    let mut partial = ViewConfig::default();
    partial.mask.default_opacity = 0.4;

    let merged = base.merge_partial(partial);
    assert_eq!(merged.stage.width, 2048.0);
    assert_eq!(merged.mask.default_opacity, 0.4);
    assert_eq!(merged.tween, TweenConfig::default());
}
