//! Integration tests for ConfigManager and installer settings
//!
//! These tests verify:
//! - Defaults when `ezbcoin.yaml` is absent
//! - File values over defaults
//! - `EZBCOIN_*` overrides over file values

use camino::Utf8PathBuf;
use config::{Environment, Map};
use ezbcoin::ConfigManager;
use ezbcoin::models::{InstallerSettings, StepPolicy};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

fn env(vars: &[(&str, &str)]) -> Environment {
    let mut map = Map::new();
    for (key, value) in vars {
        map.insert(key.to_string(), value.to_string());
    }
    Environment::with_prefix(ezbcoin::config::ENV_PREFIX).source(Some(map))
}

#[test]
fn test_settings_path() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path);

    assert_eq!(manager.settings_dir(), config_path.as_path());
    assert_eq!(manager.settings_path(), config_path.join("ezbcoin.yaml").as_path());
}

#[test]
fn test_no_overrides_keeps_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path);

    let settings = manager
        .apply_env_overrides(InstallerSettings::default(), env(&[]))
        .unwrap();
    assert_eq!(settings, InstallerSettings::default());
}

#[test]
fn test_env_overrides_file_values() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path);
    fs::write(
        manager.settings_path(),
        "readiness_timeout_secs: 30\nshell: zsh\nrevisions:\n  bpanel: v1.0.0\n",
    )
    .unwrap();

    let base = manager.load_file_settings().unwrap();
    let settings = manager
        .apply_env_overrides(
            base,
            env(&[
                ("EZBCOIN_READINESS_TIMEOUT_SECS", "0"),
                ("EZBCOIN_INSTALL_POLICY", "abort"),
                ("EZBCOIN_DEBUG_MODE", "true"),
            ]),
        )
        .unwrap();

    assert_eq!(settings.readiness_timeout(), None);
    assert_eq!(settings.install_policy, StepPolicy::Abort);
    assert!(settings.debug_mode);
    assert_eq!(settings.shell, "zsh");
    assert_eq!(settings.revisions.get("bpanel").map(String::as_str), Some("v1.0.0"));
}

#[test]
fn test_unrelated_variables_are_ignored() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path);

    let settings = manager
        .apply_env_overrides(
            InstallerSettings::default(),
            env(&[("OTHER_ECHO_WIDTH", "5"), ("EZBCOIN_ECHO_WIDTH", "80")]),
        )
        .unwrap();

    assert_eq!(settings.echo_width, 80);
    assert_eq!(settings.readiness_timeout(), Some(Duration::from_secs(600)));
}

#[test]
fn test_invalid_policy_is_rejected() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path);

    let result = manager.apply_env_overrides(
        InstallerSettings::default(),
        env(&[("EZBCOIN_FETCH_POLICY", "sometimes")]),
    );
    assert!(result.is_err());
}
