//! Configuration resolution tests
//!
//! Covers:
//! - Missing TOML file falls back to defaults
//! - Malformed TOML is reported as a configuration error
//! - Priority order CLI → ENV → TOML for each setting
//!
//! Tests that touch SDIR_* environment variables are marked #[serial] so they
//! never run in parallel with each other.

use sdir_common::config::{
    load_toml_config, resolve_config_path, resolve_setting, ListSource,
    SheetsSettings, SheetsToml, TomlConfig, ENV_CONFIG, ENV_LIST_SOURCE, ENV_SHEETS_API_KEY,
    ENV_SHEET_ID, ENV_SPREADSHEET_ID, ENV_WEB_APP_URL,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn clear_env() {
    for var in [
        ENV_CONFIG,
        ENV_LIST_SOURCE,
        ENV_SHEETS_API_KEY,
        ENV_SHEET_ID,
        ENV_SPREADSHEET_ID,
        ENV_WEB_APP_URL,
        sdir_common::config::ENV_FORM_URL,
    ] {
        env::remove_var(var);
    }
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_toml_config(&dir.path().join("absent.toml")).unwrap();

    assert!(config.bind.is_none());
    assert_eq!(config.logging.level, "info");
    assert!(config.sheets.api_key.is_none());
}

#[test]
fn test_malformed_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "bind = [unterminated").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_load_config_sections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sdir-ds.toml");
    std::fs::write(
        &path,
        r#"
bind = "0.0.0.0:8080"

[logging]
level = "debug"

[sheets]
spreadsheet_id = "sheet-123"
list_source = "csv"
"#,
    )
    .unwrap();

    let loaded = load_toml_config(&path).unwrap();
    assert_eq!(loaded.bind.as_deref(), Some("0.0.0.0:8080"));
    assert_eq!(loaded.logging.level, "debug");
    assert_eq!(loaded.sheets.spreadsheet_id.as_deref(), Some("sheet-123"));
    assert_eq!(loaded.sheets.list_source.as_deref(), Some("csv"));
    assert!(loaded.sheets.web_app_url.is_none());
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    env::set_var(ENV_SPREADSHEET_ID, "from-env");

    let toml = TomlConfig {
        sheets: SheetsToml {
            spreadsheet_id: Some("from-toml".to_string()),
            sheet_id: Some("42".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let settings = SheetsSettings::resolve(&toml, None).unwrap();

    assert_eq!(settings.spreadsheet_id.as_deref(), Some("from-env"));
    assert_eq!(settings.sheet_id.as_deref(), Some("42"));
    assert_eq!(settings.api_key, None);
    assert_eq!(settings.list_source, ListSource::Api);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env_for_list_source() {
    clear_env();
    env::set_var(ENV_LIST_SOURCE, "api");

    let settings = SheetsSettings::resolve(&TomlConfig::default(), Some("csv")).unwrap();
    assert_eq!(settings.list_source, ListSource::Csv);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_list_source_is_config_error() {
    clear_env();
    env::set_var(ENV_LIST_SOURCE, "excel");

    assert!(SheetsSettings::resolve(&TomlConfig::default(), None).is_err());

    clear_env();
}

#[test]
#[serial]
fn test_blank_values_count_as_absent() {
    clear_env();
    env::set_var(ENV_WEB_APP_URL, "   ");

    let value = resolve_setting(
        "web_app_url",
        None,
        ENV_WEB_APP_URL,
        Some("https://script.example/exec"),
    );
    assert_eq!(value.as_deref(), Some("https://script.example/exec"));

    assert_eq!(resolve_setting("web_app_url", Some(""), ENV_WEB_APP_URL, None), None);

    clear_env();
}

#[test]
#[serial]
fn test_config_path_priority() {
    clear_env();

    let cli = PathBuf::from("/tmp/cli.toml");
    assert_eq!(resolve_config_path(Some(&cli)), Some(cli.clone()));

    env::set_var(ENV_CONFIG, "/tmp/env.toml");
    assert_eq!(resolve_config_path(None).as_deref(), Some(Path::new("/tmp/env.toml")));
    assert_eq!(resolve_config_path(Some(&cli)), Some(cli));

    clear_env();
}
