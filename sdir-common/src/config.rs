//! Configuration loading and resolution
//!
//! Settings are read once at startup. Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority, where one exists)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG: &str = "SDIR_CONFIG";
pub const ENV_SHEETS_API_KEY: &str = "SDIR_SHEETS_API_KEY";
pub const ENV_SPREADSHEET_ID: &str = "SDIR_SPREADSHEET_ID";
pub const ENV_SHEET_ID: &str = "SDIR_SHEET_ID";
pub const ENV_WEB_APP_URL: &str = "SDIR_WEB_APP_URL";
pub const ENV_FORM_URL: &str = "SDIR_FORM_URL";
pub const ENV_LIST_SOURCE: &str = "SDIR_LIST_SOURCE";
pub const ENV_BIND: &str = "SDIR_BIND";

/// Default listen address of the directory service
pub const DEFAULT_BIND: &str = "127.0.0.1:5731";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Bootstrap configuration loaded from TOML
///
/// ```toml
/// bind = "0.0.0.0:5731"
///
/// [logging]
/// level = "debug"
///
/// [sheets]
/// api_key = "AIza..."
/// spreadsheet_id = "1AbC..."
/// sheet_id = "0"
/// web_app_url = "https://script.google.com/macros/s/.../exec"
/// list_source = "api"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// HTTP listen address
    #[serde(default)]
    pub bind: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub sheets: SheetsToml,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// `[sheets]` table of the TOML config
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SheetsToml {
    pub api_key: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub sheet_id: Option<String>,
    pub web_app_url: Option<String>,
    pub form_url: Option<String>,
    pub list_source: Option<String>,
}

/// How the record list is fetched from the spreadsheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListSource {
    /// Sheets values API (needs an API key)
    #[default]
    Api,
    /// Public CSV export of the sheet
    Csv,
}

impl FromStr for ListSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(ListSource::Api),
            "csv" => Ok(ListSource::Csv),
            other => Err(Error::Config(format!(
                "Unknown list source '{}' (expected 'api' or 'csv')",
                other
            ))),
        }
    }
}

impl fmt::Display for ListSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListSource::Api => f.write_str("api"),
            ListSource::Csv => f.write_str("csv"),
        }
    }
}

/// Resolved spreadsheet settings
///
/// Absent values are kept as `None`; the store reports the misconfiguration
/// when an operation that needs the value is attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetsSettings {
    pub api_key: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub sheet_id: Option<String>,
    pub web_app_url: Option<String>,
    pub form_url: Option<String>,
    pub list_source: ListSource,
}

impl SheetsSettings {
    /// Resolve from environment and TOML; `cli_list_source` overrides both
    pub fn resolve(toml: &TomlConfig, cli_list_source: Option<&str>) -> Result<Self> {
        let sheets = &toml.sheets;

        let list_source = match resolve_setting(
            "list_source",
            cli_list_source,
            ENV_LIST_SOURCE,
            sheets.list_source.as_deref(),
        ) {
            Some(value) => value.parse()?,
            None => ListSource::default(),
        };

        let settings = Self {
            api_key: resolve_setting("api_key", None, ENV_SHEETS_API_KEY, sheets.api_key.as_deref()),
            spreadsheet_id: resolve_setting(
                "spreadsheet_id",
                None,
                ENV_SPREADSHEET_ID,
                sheets.spreadsheet_id.as_deref(),
            ),
            sheet_id: resolve_setting("sheet_id", None, ENV_SHEET_ID, sheets.sheet_id.as_deref()),
            web_app_url: resolve_setting(
                "web_app_url",
                None,
                ENV_WEB_APP_URL,
                sheets.web_app_url.as_deref(),
            ),
            form_url: resolve_setting("form_url", None, ENV_FORM_URL, sheets.form_url.as_deref()),
            list_source,
        };

        info!(
            list_source = %settings.list_source,
            api_key = settings.api_key.is_some(),
            spreadsheet_id = settings.spreadsheet_id.is_some(),
            sheet_id = settings.sheet_id.is_some(),
            web_app_url = settings.web_app_url.is_some(),
            "Spreadsheet settings resolved"
        );

        Ok(settings)
    }
}

/// Resolve one string setting: CLI → ENV → TOML
///
/// Blank values count as absent. Warns when more than one source supplies a
/// value, since only the highest-priority one is used.
pub fn resolve_setting(
    name: &str,
    cli: Option<&str>,
    env_var: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    let env_value = std::env::var(env_var).ok();

    let candidates = [
        ("command line", cli),
        ("environment", env_value.as_deref()),
        ("TOML", toml_value),
    ];
    let present: Vec<(&str, &str)> = candidates
        .into_iter()
        .filter_map(|(source, value)| value.filter(|v| is_present(v)).map(|v| (source, v)))
        .collect();

    if present.len() > 1 {
        let sources: Vec<&str> = present.iter().map(|(source, _)| *source).collect();
        warn!(
            "Setting '{}' found in multiple sources: {}. Using {} (highest priority).",
            name,
            sources.join(", "),
            sources[0]
        );
    }

    present.first().map(|(_, value)| value.trim().to_string())
}

fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Default config file location for the platform
///
/// `~/.config/sdir/sdir-ds.toml` on Linux, the equivalent config directory elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sdir").join("sdir-ds.toml"))
}

/// Config file to load: CLI → `SDIR_CONFIG` → platform default
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(ENV_CONFIG).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    default_config_path()
}

/// Load the TOML config, falling back to defaults when the file does not exist
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found: {} (using environment and defaults)",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}
