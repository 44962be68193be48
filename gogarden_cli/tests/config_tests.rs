//! Configuration manager behavior against isolated config files

use gogarden_cli::config::{ConfigManager, KNOWN_KEYS};
use std::fs;
use tempfile::TempDir;

fn create_test_config_manager(temp_dir: &TempDir) -> ConfigManager {
    ConfigManager::with_path(temp_dir.path().join("config.toml"))
}

#[test]
fn test_file_values_override_defaults() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("config.toml"),
        "[cache]\nmax_age_days = 3\n\n[network]\ntimeout_seconds = 15\n",
    )
    .unwrap();
    let manager = create_test_config_manager(&temp_dir);

    let config = manager.load().unwrap();

    assert_eq!(config.cache.max_age_days, 3);
    assert_eq!(config.cache.max_size_mb, 50);
    assert_eq!(
        config.network.downloader_config().timeout,
        Some(std::time::Duration::from_secs(15))
    );
}

#[test]
fn test_set_preserves_other_sections() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    manager.set("history.max_entries", "20").unwrap();
    manager.set("network.user_agent", "garden-test/1.0").unwrap();
    manager.set("history.max_entries", "30").unwrap();

    let content = fs::read_to_string(temp_dir.path().join("config.toml")).unwrap();
    assert!(content.contains("[history]"));
    assert!(content.contains("[network]"));

    let config = manager.load().unwrap();
    assert_eq!(config.history.max_entries, 30);
    assert_eq!(config.network.user_agent, "garden-test/1.0");
}

#[test]
fn test_path_values_are_stored_as_strings() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    manager.set("history.path", "/srv/garden/history.json").unwrap();

    assert_eq!(
        manager.get("history.path").unwrap(),
        "/srv/garden/history.json"
    );
    assert_eq!(
        manager.load().unwrap().history.resolved_path(),
        std::path::PathBuf::from("/srv/garden/history.json")
    );
}

#[test]
fn test_every_known_key_accepts_a_sample_value() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    for key in KNOWN_KEYS {
        let value = match *key {
            "cache.directory" => "/tmp/plant-images",
            "history.path" => "/tmp/history.json",
            "network.user_agent" => "gogarden-test",
            "output.color_enabled" => "false",
            _ => "5",
        };
        manager
            .set(key, value)
            .unwrap_or_else(|e| panic!("{key} rejected {value}: {e}"));
    }

    let config = manager.load().unwrap();
    assert_eq!(config.cache.preload_throttle_ms, 5);
    assert!(!config.output.color_enabled);
}

#[test]
fn test_list_includes_optional_keys_once_set() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    let before = manager.list().unwrap();
    assert!(!before.iter().any(|(k, _)| k == "cache.directory"));

    manager.set("cache.directory", "/tmp/images").unwrap();
    let after = manager.list().unwrap();
    assert!(
        after
            .iter()
            .any(|(k, v)| k == "cache.directory" && v == "/tmp/images")
    );
}
