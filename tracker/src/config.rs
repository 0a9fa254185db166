//! Configuration management for the tracker service.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Registry configuration
    pub registry: RegistryConfig,
    /// Verification token configuration
    pub verification: VerificationConfig,
    /// Snapshot persistence configuration
    pub storage: StorageConfig,
    /// Log output configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Largest accepted request body (CSV uploads)
    pub max_upload_bytes: usize,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Store action broadcast buffer
    pub broadcast_capacity: usize,
    /// Extra identifier draws after a collision
    pub max_identifier_retries: u32,
    /// `limit` used when a search does not give one
    pub default_page_limit: usize,
}

/// Verification token configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Key for token tags
    pub secret: String,
    /// Token age bound in seconds (0 = unlimited)
    pub max_age_secs: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot directory; persistence is off when unset
    pub data_dir: Option<PathBuf>,
    /// Seconds between snapshot checks
    pub snapshot_interval_secs: u64,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `text` or `json`
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 8000),
                request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 10),
                max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
                shutdown_timeout_secs: parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30),
            },
            registry: RegistryConfig {
                broadcast_capacity: parse_or(&lookup, "BROADCAST_CAPACITY", 1024),
                max_identifier_retries: parse_or(&lookup, "MAX_IDENTIFIER_RETRIES", 8),
                default_page_limit: parse_opt(&lookup, "DEFAULT_PAGE_LIMIT")
                    .filter(|limit: &usize| *limit >= 1)
                    .unwrap_or(100),
            },
            verification: VerificationConfig {
                secret: lookup("VERIFICATION_SECRET")
                    .filter(|secret| !secret.is_empty())
                    .unwrap_or_else(|| "dev-verification-secret".to_string()),
                max_age_secs: parse_or(&lookup, "VERIFICATION_MAX_AGE_SECS", 0),
            },
            storage: StorageConfig {
                data_dir: lookup("DATA_DIR")
                    .filter(|dir| !dir.trim().is_empty())
                    .map(PathBuf::from),
                snapshot_interval_secs: parse_opt(&lookup, "SNAPSHOT_INTERVAL_SECS")
                    .filter(|secs: &u64| *secs >= 1)
                    .unwrap_or(30),
            },
            logging: LoggingConfig {
                format: match lookup("LOG_FORMAT").as_deref().map(str::trim) {
                    Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
                    _ => LogFormat::Text,
                },
            },
        }
    }
}

fn parse_opt<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|raw| raw.trim().parse().ok())
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    parse_opt(lookup, key).unwrap_or(default)
}

impl ServerConfig {
    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Shutdown timeout as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl VerificationConfig {
    /// Token age bound, `None` when unlimited.
    #[must_use]
    pub const fn max_age(&self) -> Option<Duration> {
        if self.max_age_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.max_age_secs))
        }
    }
}

impl std::fmt::Debug for VerificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationConfig")
            .field("secret", &"<redacted>")
            .field("max_age_secs", &self.max_age_secs)
            .finish()
    }
}

impl StorageConfig {
    /// Snapshot interval as a [`Duration`].
    #[must_use]
    pub const fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_source(|_| None)
    }
}
