//! Configuration file loading
//!
//! A single YAML document with three sections (`services`, `polling`,
//! `logging`). Every field has a default, so an empty file is valid.

use crate::poll::PollConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `services.books_url`.
pub const BOOKS_URL_ENV: &str = "STAGEWATCH_BOOKS_URL";
/// Environment variable overriding `services.search_url`.
pub const SEARCH_URL_ENV: &str = "STAGEWATCH_SEARCH_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Base URL of the document pipeline (books) API
    pub books_url: String,
    /// Base URL of the search/embedding API
    pub search_url: String,
    /// Per-request timeout for both services
    pub request_timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            books_url: "http://localhost:8000".to_string(),
            search_url: "http://localhost:8001".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServicesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub services: ServicesConfig,
    pub polling: PollConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config = Self::parse(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from `path`, apply environment overrides, validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(BOOKS_URL_ENV) {
            self.services.books_url = url;
        }
        if let Ok(url) = std::env::var(SEARCH_URL_ENV) {
            self.services.search_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Invalid("polling.interval_ms must be positive".into()));
        }
        if self.services.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "services.request_timeout_secs must be positive".into(),
            ));
        }
        for (name, url) in [
            ("services.books_url", &self.services.books_url),
            ("services.search_url", &self.services.search_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!("{} must be an http(s) URL, got '{}'", name, url)));
            }
        }
        Ok(())
    }
}

/// Default config location (`<config dir>/stagewatch/config.yaml`).
pub fn default_config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
    config_dir.join("stagewatch").join("config.yaml")
}
