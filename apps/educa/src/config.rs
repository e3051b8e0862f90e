//! # Server Configuration
//!
//! `ServerConfig` is resolved in three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config educa.toml`)
//! 3. Environment variables
//!
//! ## Environment Variables
//!
//! - `EDUCA_API_KEY`: Bearer key for `/api/admin/*` (admin routes are not mounted without it)
//! - `EDUCA_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all
//! - `EDUCA_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `EDUCA_CACHE_TTL_SECS`: Lifetime of cached listings (default: 300)
//! - `EDUCA_CHAT_HISTORY`: Messages returned with a chat room (default: 5)
//! - `EDUCA_LOG_FORMAT`: `text` (default) or `json`

use educa_core::primitives::CHAT_HISTORY_LIMIT;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Default lifetime of cached listings, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value '{value}' for {var}")]
    InvalidValue { var: &'static str, value: String },
}

// =============================================================================
// CONFIG
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub api_key: Option<String>,
    /// `"*"` or a comma-separated origin list. `None` allows localhost only.
    pub cors_origins: Option<String>,
    pub rate_limit: u32,
    pub cache_ttl_secs: u64,
    pub chat_history: usize,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            cors_origins: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            chat_history: CHAT_HISTORY_LIMIT,
            log_format: LogFormat::Text,
        }
    }
}

// Keep the API key out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit", &self.rate_limit)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("chat_history", &self.chat_history)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ServerConfig {
    /// Defaults, then the file at `path` (if any), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|var| std::env::var(var).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay environment variables read through `lookup`.
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(key) = lookup("EDUCA_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(origins) = lookup("EDUCA_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
        if let Some(value) = lookup("EDUCA_RATE_LIMIT") {
            self.rate_limit = parse_number("EDUCA_RATE_LIMIT", &value)?;
        }
        if let Some(value) = lookup("EDUCA_CACHE_TTL_SECS") {
            self.cache_ttl_secs = parse_number("EDUCA_CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = lookup("EDUCA_CHAT_HISTORY") {
            self.chat_history = parse_number("EDUCA_CHAT_HISTORY", &value)?;
        }
        if let Some(value) = lookup("EDUCA_LOG_FORMAT") {
            self.log_format =
                LogFormat::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                    var: "EDUCA_LOG_FORMAT",
                    value,
                })?;
        }
        Ok(self)
    }

    /// The admin key, if one is configured and non-empty.
    pub fn admin_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        })
}

// =============================================================================
// TESTS
// =============================================================================
