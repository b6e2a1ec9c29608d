//! Bootstrap configuration loading and resolution
//!
//! Settings are resolved per field in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`LCA_DASH_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error; the resolver falls back to defaults.
//! A TOML file that exists but cannot be parsed is reported as `Error::Config`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the backend base URL
pub const ENV_API_URL: &str = "LCA_DASH_API_URL";
/// Environment variable overriding the data folder (session, history)
pub const ENV_DATA_FOLDER: &str = "LCA_DASH_DATA_FOLDER";
/// Environment variable pointing at an explicit TOML config file
pub const ENV_CONFIG_FILE: &str = "LCA_DASH_CONFIG";
/// Environment variable overriding the job polling interval
pub const ENV_POLL_INTERVAL_MS: &str = "LCA_DASH_POLL_INTERVAL_MS";

const SESSION_FILE: &str = "session.json";
const HISTORY_FILE: &str = "upload_history.json";

/// Bootstrap configuration as read from the TOML file
///
/// Every field is optional so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Backend REST API base URL (e.g. `https://lca.example.com/api`)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Folder holding the persisted session and upload history
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    /// Interval between job status requests when the server suggests none
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    /// Upper bound on status requests for a single job
    #[serde(default)]
    pub max_poll_attempts: Option<u32>,

    /// Per-request HTTP timeout
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub level: Option<String>,
}

/// Built-in fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub api_base_url: String,
    pub data_folder: PathBuf,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary runs on
    pub fn for_current_platform() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            data_folder: default_data_folder(),
            poll_interval_ms: 2000,
            max_poll_attempts: 300,
            request_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lca-dash"))
        .unwrap_or_else(|| PathBuf::from("./lca_dash_data"))
}

/// Default TOML config location (`~/.config/lca-dash/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lca-dash").join("config.toml"))
}

/// Command-line overrides (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub data_folder: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct DashConfig {
    pub api_base_url: String,
    pub data_folder: PathBuf,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub request_timeout: Duration,
    pub log_level: String,
}

impl DashConfig {
    /// Persisted session location
    pub fn session_path(&self) -> PathBuf {
        self.data_folder.join(SESSION_FILE)
    }

    /// Persisted upload history location
    pub fn history_path(&self) -> PathBuf {
        self.data_folder.join(HISTORY_FILE)
    }

    /// Create the data folder if it does not exist yet
    pub fn ensure_data_folder(&self) -> Result<()> {
        if !self.data_folder.exists() {
            std::fs::create_dir_all(&self.data_folder)?;
            info!("Created data folder: {}", self.data_folder.display());
        }
        Ok(())
    }
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Resolves `DashConfig` from CLI, environment, TOML and compiled defaults
pub struct ConfigResolver {
    overrides: CliOverrides,
    defaults: CompiledDefaults,
}

impl ConfigResolver {
    pub fn new(overrides: CliOverrides) -> Self {
        Self {
            overrides,
            defaults: CompiledDefaults::for_current_platform(),
        }
    }

    /// Locate and load the TOML file, if any
    ///
    /// An explicitly named file (CLI or environment) must exist; the default
    /// location is optional.
    fn load_toml(&self) -> Result<TomlConfig> {
        let explicit = self
            .overrides
            .config_file
            .clone()
            .or_else(|| std::env::var(ENV_CONFIG_FILE).ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            info!("Loading config from {}", path.display());
            return load_toml_config(&path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                load_toml_config(&path)
            }
            _ => {
                debug!("No config file found, using defaults");
                Ok(TomlConfig::default())
            }
        }
    }

    pub fn resolve(&self) -> Result<DashConfig> {
        let toml_config = self.load_toml()?;

        let api_base_url = self
            .overrides
            .api_base_url
            .clone()
            .or_else(|| std::env::var(ENV_API_URL).ok())
            .or(toml_config.api_base_url)
            .unwrap_or_else(|| self.defaults.api_base_url.clone());
        let api_base_url = normalize_base_url(&api_base_url)?;

        let data_folder = self
            .overrides
            .data_folder
            .clone()
            .or_else(|| std::env::var(ENV_DATA_FOLDER).ok().map(PathBuf::from))
            .or(toml_config.data_folder)
            .unwrap_or_else(|| self.defaults.data_folder.clone());

        let env_interval = std::env::var(ENV_POLL_INTERVAL_MS).ok().and_then(|raw| {
            match raw.trim().parse::<u64>() {
                Ok(ms) => Some(ms),
                Err(_) => {
                    warn!("Ignoring {}={:?}: not a number", ENV_POLL_INTERVAL_MS, raw);
                    None
                }
            }
        });
        let poll_interval_ms = env_interval
            .or(toml_config.poll_interval_ms)
            .unwrap_or(self.defaults.poll_interval_ms);

        let max_poll_attempts = toml_config
            .max_poll_attempts
            .unwrap_or(self.defaults.max_poll_attempts);
        if max_poll_attempts == 0 {
            return Err(Error::Config(
                "max_poll_attempts must be at least 1".to_string(),
            ));
        }

        let request_timeout_secs = toml_config
            .request_timeout_secs
            .unwrap_or(self.defaults.request_timeout_secs);
        if request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }

        let log_level = self
            .overrides
            .log_level
            .clone()
            .or(toml_config.logging.level)
            .unwrap_or_else(|| self.defaults.log_level.clone());

        Ok(DashConfig {
            api_base_url,
            data_folder,
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_poll_attempts,
            request_timeout: Duration::from_secs(request_timeout_secs),
            log_level,
        })
    }
}

/// Validate the scheme and strip trailing slashes
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API base URL must start with http:// or https://: {}",
            raw
        )));
    }
    Ok(trimmed.to_string())
}
