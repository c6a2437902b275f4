use crate::config::*;
use crate::testing;
use std::fs;
use std::path::PathBuf;

#[test]
fn test_folders_roundtrip() {
    let (config, _tmp) = testing::config();
    assert!(load_selected_folders(&config).is_empty());

    let folders = vec![PathBuf::from("/music/rock"), PathBuf::from("/music/jazz")];
    save_selected_folders(&config, &folders).unwrap();
    assert_eq!(load_selected_folders(&config), folders);

    // Rewriting replaces the stored list wholesale.
    let fewer = vec![PathBuf::from("/music/jazz")];
    save_selected_folders(&config, &fewer).unwrap();
    assert_eq!(load_selected_folders(&config), fewer);
}

#[test]
fn test_folders_corrupt_store() {
    let (config, _tmp) = testing::config();
    fs::write(config.folders_path(), "][").unwrap();
    assert!(load_selected_folders(&config).is_empty());
}

#[test]
fn test_settings_defaults() {
    let (config, _tmp) = testing::config();
    let settings = Settings::load(&config);
    assert_eq!(settings.pick_count, DEFAULT_PICK_COUNT);
    assert_eq!(settings.theme, DEFAULT_THEME);
}

#[test]
fn test_settings_roundtrip() {
    let (config, _tmp) = testing::config();
    let settings = Settings {
        pick_count: 25,
        theme: "Glass".to_string(),
    };
    settings.save(&config).unwrap();
    assert_eq!(Settings::load(&config), settings);
}

#[test]
fn test_settings_missing_fields_take_defaults() {
    let (config, _tmp) = testing::config();
    fs::write(config.settings_path(), r#"{"theme": "Glass"}"#).unwrap();
    let settings = Settings::load(&config);
    assert_eq!(settings.pick_count, DEFAULT_PICK_COUNT);
    assert_eq!(settings.theme, "Glass");
}

#[test]
fn test_settings_corrupt_store() {
    let (config, _tmp) = testing::config();
    fs::write(config.settings_path(), "not json").unwrap();
    assert_eq!(Settings::load(&config), Settings::default());
}

#[test]
fn test_document_paths_live_under_config_dir() {
    let (config, _tmp) = testing::config();
    for path in [config.tags_cache_path(), config.folders_path(), config.settings_path(), config.assistant_config_path()] {
        assert!(path.starts_with(&config.config_dir));
    }
}
