//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use crate::i18n::Language;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_STATE_DIR: &str = "./.educonnect";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub state_dir: PathBuf,
    pub language: Language,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        // --- Backend Settings ---
        let api_url = non_empty("EDUCONNECT_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "EDUCONNECT_API_URL".to_string(),
                format!("'{api_url}' must start with http:// or https://"),
            ));
        }

        let request_timeout = parse_secs(
            "EDUCONNECT_REQUEST_TIMEOUT_SECS",
            non_empty("EDUCONNECT_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let poll_interval = parse_secs(
            "EDUCONNECT_POLL_INTERVAL_SECS",
            non_empty("EDUCONNECT_POLL_INTERVAL_SECS"),
            DEFAULT_POLL_INTERVAL_SECS,
        )?;

        // --- Local State ---
        let state_dir = non_empty("EDUCONNECT_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

        let language = match non_empty("EDUCONNECT_LANGUAGE") {
            Some(raw) => raw.parse::<Language>().map_err(|e| {
                ConfigError::InvalidValue("EDUCONNECT_LANGUAGE".to_string(), e)
            })?,
            None => Language::default(),
        };

        let log_level_str = non_empty("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            request_timeout,
            poll_interval,
            state_dir,
            language,
            log_level,
        })
    }
}

fn parse_secs(name: &str, raw: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(default));
    };
    let secs = raw.parse::<u64>().map_err(|_| {
        ConfigError::InvalidValue(
            name.to_string(),
            format!("'{raw}' is not a whole number of seconds"),
        )
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
