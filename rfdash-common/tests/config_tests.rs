//! Integration tests for configuration file discovery and loading
//!
//! Tests that touch RFDASH_CONFIG are marked #[serial] so they never race
//! on the process environment.

use rfdash_common::config::{
    config_file_path, load_toml_config, ConfigOverrides, DashboardConfig, CONFIG_FILE_ENV,
};
use rfdash_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
#[serial]
fn test_explicit_config_file_is_used() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rfdash.toml");
    fs::write(
        &path,
        r#"
        secret_key = "file-secret"
        bind = "0.0.0.0:8080"
        password_hash_cost = 6
        "#,
    )
    .unwrap();

    env::set_var(CONFIG_FILE_ENV, &path);
    let config = DashboardConfig::resolve(ConfigOverrides::default());
    env::remove_var(CONFIG_FILE_ENV);

    let config = config.unwrap();
    assert_eq!(config.secret_key, "file-secret");
    assert_eq!(config.bind, "0.0.0.0:8080");
    assert_eq!(config.password_hash_cost, 6);
    assert!(!config.uses_dev_secret());
}

#[test]
#[serial]
fn test_overrides_beat_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rfdash.toml");
    fs::write(&path, "bind = \"0.0.0.0:8080\"\nreset_on_schema_drift = true\n").unwrap();

    env::set_var(CONFIG_FILE_ENV, &path);
    let config = DashboardConfig::resolve(ConfigOverrides {
        bind: Some("127.0.0.1:9999".to_string()),
        reset_on_schema_drift: Some(false),
        ..Default::default()
    });
    env::remove_var(CONFIG_FILE_ENV);

    let config = config.unwrap();
    assert_eq!(config.bind, "127.0.0.1:9999");
    assert!(!config.reset_on_schema_drift);
}

#[test]
#[serial]
fn test_config_env_points_at_path() {
    env::set_var(CONFIG_FILE_ENV, "/some/where/rfdash.toml");
    let path = config_file_path();
    env::remove_var(CONFIG_FILE_ENV);

    assert_eq!(path, Some(std::path::PathBuf::from("/some/where/rfdash.toml")));
}

#[test]
#[serial]
fn test_missing_explicit_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    env::set_var(CONFIG_FILE_ENV, dir.path().join("absent.toml"));
    let result = DashboardConfig::resolve(ConfigOverrides::default());
    env::remove_var(CONFIG_FILE_ENV);

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_toml_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "secret_key = [unterminated").unwrap();

    match load_toml_config(&path) {
        Err(Error::Config(message)) => assert!(message.contains("Invalid TOML")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_unknown_keys_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("extra.toml");
    fs::write(&path, "bind = \"1.2.3.4:5\"\nlegacy_option = 3\n").unwrap();

    let parsed = load_toml_config(&path).unwrap();
    assert_eq!(parsed.bind.as_deref(), Some("1.2.3.4:5"));
}
