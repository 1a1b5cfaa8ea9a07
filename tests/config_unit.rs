//! Unit tests for configuration file loading.

use std::io::Write;

use chafa_draw::{Config, ConfigError, QualityOptions, QualityPreset};

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.toml");
    let config = Config::load(Some(&path)).unwrap();
    assert!(config.quality.preset.is_none());
    assert_eq!(config.quality_options(), QualityOptions::default());
}

#[test]
fn test_load_quality_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "[quality]\npreset = \"low\"\nwork_factor = 0.3\ndithering = true"
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.quality.preset, Some(QualityPreset::Low));

    let options = config.quality_options();
    assert_eq!(options.work_factor, 0.3);
    assert!(options.dithering); // override beats the preset
    assert!(!options.optimizations);
}

#[test]
fn test_load_session_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[session]\nx11 = true\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.session.x11, Some(true));
}

#[test]
fn test_empty_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert!(config.quality.preset.is_none());
    assert!(config.session.x11.is_none());
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[quality\npreset = ???").unwrap();

    match Config::load(Some(&path)) {
        Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected a parse error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unknown_preset_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[quality]\npreset = \"best\"\n").unwrap();

    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Parse { .. })
    ));
}
