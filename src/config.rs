//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DATA_DIR_NAME: &str = ".guessgame";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API URL: {0}")]
    InvalidApiUrl(String),
    #[error("home directory not found; set GUESSGAME_DATA_DIR")]
    NoDataDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin without the `/api` suffix and without a trailing slash.
    pub api_url: String,
    pub timeouts: Timeouts,
    /// Directory holding durable client storage.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `GUESSGAME_API_URL`: default `http://localhost:8080`
    /// - `GUESSGAME_REQUEST_TIMEOUT_SECS`: default 30
    /// - `GUESSGAME_CONNECT_TIMEOUT_SECS`: default 10
    /// - `GUESSGAME_DATA_DIR`: default `~/.guessgame`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the API URL is not http(s) or no data
    /// directory can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("GUESSGAME_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let data_dir = match std::env::var_os("GUESSGAME_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let timeouts = Timeouts {
            request_secs: env_parse_u64("GUESSGAME_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("GUESSGAME_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Self::new(&api_url, data_dir, timeouts)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] when `api_url` is not http(s).
    pub fn new(api_url: &str, data_dir: PathBuf, timeouts: Timeouts) -> Result<Self, ConfigError> {
        Ok(Self { api_url: normalize_api_url(api_url)?, timeouts, data_dir })
    }

    /// Base URL every API path is joined onto.
    #[must_use]
    pub fn api_base(&self) -> String {
        format!("{}/api", self.api_url)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.request_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// `~/.guessgame`.
///
/// # Errors
///
/// Returns [`ConfigError::NoDataDir`] when the home directory is unknown.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME)).ok_or(ConfigError::NoDataDir)
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/api").unwrap_or(trimmed);
    let valid = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    if !valid {
        return Err(ConfigError::InvalidApiUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
