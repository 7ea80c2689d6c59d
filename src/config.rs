//! Runtime configuration.
//!
//! Read from the process environment. Unset or unparsable values fall back
//! to the defaults below.

use crate::client::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_STORAGE_PATH: &str = ".folio-session.json";
pub const DEFAULT_READ_RETRIES: u32 = 0;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

pub const ENV_API_BASE_URL: &str = "FOLIO_API_BASE_URL";
pub const ENV_STORAGE_PATH: &str = "FOLIO_STORAGE_PATH";
pub const ENV_READ_RETRIES: &str = "FOLIO_READ_RETRIES";
pub const ENV_RETRY_BACKOFF_MS: &str = "FOLIO_RETRY_BACKOFF_MS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "FOLIO_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("API base URL must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolioConfig {
    pub api_base_url: String,
    /// Where the session token is persisted.
    pub storage_path: PathBuf,
    pub read_retries: u32,
    pub retry_backoff: Duration,
    /// `None` keeps the transport default.
    pub request_timeout: Option<Duration>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            read_retries: DEFAULT_READ_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            request_timeout: None,
        }
    }
}

impl FolioConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FolioConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            api_base_url: text(ENV_API_BASE_URL).unwrap_or(defaults.api_base_url),
            storage_path: text(ENV_STORAGE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            read_retries: parse_or(ENV_READ_RETRIES, text(ENV_READ_RETRIES), defaults.read_retries),
            retry_backoff: Duration::from_millis(parse_or(
                ENV_RETRY_BACKOFF_MS,
                text(ENV_RETRY_BACKOFF_MS),
                DEFAULT_RETRY_BACKOFF_MS,
            )),
            request_timeout: text(ENV_REQUEST_TIMEOUT_SECS)
                .and_then(|raw| match raw.parse::<u64>() {
                    Ok(0) => None,
                    Ok(secs) => Some(Duration::from_secs(secs)),
                    Err(_) => {
                        warn!(key = ENV_REQUEST_TIMEOUT_SECS, value = %raw, "ignoring unparsable setting");
                        None
                    }
                }),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.as_str();
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidBaseUrl(url.to_string()))
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.read_retries,
            backoff: self.retry_backoff,
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }),
    }
}
