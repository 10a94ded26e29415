use std::fs;
use tangentcam_core::OutputUnits;
use tangentcam_settings::{Config, SettingsError};
use tangentcam_toolpath::{PathOrder, SpindleMode};
use tempfile::TempDir;

#[test]
fn test_save_and_load_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::new();
    config.tool.width = 1.5;
    config.tool.trail_offset = 0.8;
    config.spindle.mode = SpindleMode::Once;
    config.spindle.rpm = 18000.0;
    config.ordering.order = PathOrder::Flip;
    config.output.units = OutputUnits::Mm;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_and_load_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut config = Config::new();
    config.brush.reload = true;
    config.brush.reload_paths = 4;
    config.output.header_comments = vec!["first".to_string(), "second".to_string()];
    config.save_to_file(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"reload_paths\": 4"));
    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[feeds]\nxy = -10.0\n").unwrap();

    match Config::load_from_file(&path) {
        Err(SettingsError::InvalidSetting { key, .. }) => assert_eq!(key, "feeds.xy"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_load_reports_syntax_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[tool\nwidth = 1").unwrap();
    assert!(matches!(Config::load_from_file(&path), Err(SettingsError::Toml(_))));

    let json = dir.path().join("broken.json");
    fs::write(&json, "{ \"tool\": ").unwrap();
    assert!(matches!(Config::load_from_file(&json), Err(SettingsError::Json(_))));
}

#[test]
fn test_unknown_extension_and_missing_file() {
    let dir = TempDir::new().unwrap();
    let yaml = dir.path().join("config.yaml");
    fs::write(&yaml, "tool: {}").unwrap();
    assert!(matches!(
        Config::load_from_file(&yaml),
        Err(SettingsError::UnsupportedFormat(_))
    ));

    let missing = dir.path().join("missing.toml");
    let err = Config::load_from_file(&missing).unwrap_err();
    assert!(matches!(err, SettingsError::Io(_)));
    assert!(tangentcam_core::Error::from(err).is_configuration_error());
}

#[test]
fn test_default_path_is_under_config_dir() {
    if let Some(path) = Config::default_path() {
        assert!(path.ends_with("tangentcam/config.toml"));
    }
}
