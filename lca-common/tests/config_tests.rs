//! Configuration resolution tests
//!
//! Covers the priority order CLI → environment → TOML → compiled defaults,
//! and graceful handling of a missing default config file.
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.

use lca_common::config::{
    CliOverrides, CompiledDefaults, ConfigResolver, ENV_API_URL, ENV_CONFIG_FILE,
    ENV_DATA_FOLDER, ENV_POLL_INTERVAL_MS,
};
use lca_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

fn clear_env() {
    env::remove_var(ENV_API_URL);
    env::remove_var(ENV_DATA_FOLDER);
    env::remove_var(ENV_CONFIG_FILE);
    env::remove_var(ENV_POLL_INTERVAL_MS);
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();
    assert_eq!(defaults.poll_interval_ms, 2000);
    assert_eq!(defaults.max_poll_attempts, 300);
    assert_eq!(defaults.log_level, "info");
    assert!(!defaults.data_folder.as_os_str().is_empty());
}

#[test]
#[serial]
fn test_toml_values_used_when_no_overrides() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
api_base_url = "https://lca.example.com/api/"
poll_interval_ms = 750
max_poll_attempts = 12

[logging]
level = "debug"
"#,
    );

    let resolver = ConfigResolver::new(CliOverrides {
        config_file: Some(path),
        ..Default::default()
    });
    let config = resolver.resolve().unwrap();

    assert_eq!(config.api_base_url, "https://lca.example.com/api");
    assert_eq!(config.poll_interval, Duration::from_millis(750));
    assert_eq!(config.max_poll_attempts, 12);
    assert_eq!(config.log_level, "debug");
}

#[test]
#[serial]
fn test_env_overrides_toml_and_cli_overrides_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, r#"api_base_url = "https://from-toml.example.com""#);

    env::set_var(ENV_API_URL, "https://from-env.example.com");
    let from_env = ConfigResolver::new(CliOverrides {
        config_file: Some(path.clone()),
        ..Default::default()
    })
    .resolve()
    .unwrap();
    assert_eq!(from_env.api_base_url, "https://from-env.example.com");

    let from_cli = ConfigResolver::new(CliOverrides {
        config_file: Some(path),
        api_base_url: Some("https://from-cli.example.com".to_string()),
        ..Default::default()
    })
    .resolve()
    .unwrap();
    assert_eq!(from_cli.api_base_url, "https://from-cli.example.com");

    clear_env();
}

#[test]
#[serial]
fn test_invalid_poll_interval_env_is_ignored() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "poll_interval_ms = 900");

    env::set_var(ENV_POLL_INTERVAL_MS, "soon");
    let config = ConfigResolver::new(CliOverrides {
        config_file: Some(path),
        ..Default::default()
    })
    .resolve()
    .unwrap();
    assert_eq!(config.poll_interval, Duration::from_millis(900));

    clear_env();
}

#[test]
#[serial]
fn test_explicit_missing_config_file_is_error() {
    clear_env();
    let resolver = ConfigResolver::new(CliOverrides {
        config_file: Some(PathBuf::from("/nonexistent/lca-dash/config.toml")),
        ..Default::default()
    });
    assert!(matches!(resolver.resolve(), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_unparseable_config_file_is_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "poll_interval_ms = [not toml");

    let resolver = ConfigResolver::new(CliOverrides {
        config_file: Some(path),
        ..Default::default()
    });
    assert!(matches!(resolver.resolve(), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_zero_poll_attempts_rejected() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "max_poll_attempts = 0");

    let resolver = ConfigResolver::new(CliOverrides {
        config_file: Some(path),
        ..Default::default()
    });
    assert!(matches!(resolver.resolve(), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_zero_request_timeout_rejected() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "request_timeout_secs = 0");

    let resolver = ConfigResolver::new(CliOverrides {
        config_file: Some(path),
        ..Default::default()
    });
    assert!(matches!(resolver.resolve(), Err(Error::Config(ref m)) if m.contains("request_timeout_secs")));
}

#[test]
#[serial]
fn test_log_level_falls_back_to_compiled_default() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[logging]\n");

    let config = ConfigResolver::new(CliOverrides {
        config_file: Some(path.clone()),
        ..Default::default()
    })
    .resolve()
    .unwrap();
    assert_eq!(config.log_level, CompiledDefaults::for_current_platform().log_level);
    assert_eq!(config.request_timeout, Duration::from_secs(30));

    let from_cli = ConfigResolver::new(CliOverrides {
        config_file: Some(path),
        log_level: Some("lca_dash=trace".to_string()),
        ..Default::default()
    })
    .resolve()
    .unwrap();
    assert_eq!(from_cli.log_level, "lca_dash=trace");
}

#[test]
#[serial]
fn test_data_folder_paths() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "");

    let config = ConfigResolver::new(CliOverrides {
        config_file: Some(path),
        data_folder: Some(dir.path().join("state")),
        ..Default::default()
    })
    .resolve()
    .unwrap();

    assert_eq!(config.session_path(), dir.path().join("state").join("session.json"));
    assert_eq!(
        config.history_path(),
        dir.path().join("state").join("upload_history.json")
    );

    config.ensure_data_folder().unwrap();
    assert!(dir.path().join("state").is_dir());
}
