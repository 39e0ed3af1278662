//! Configuration loading and typed config structures for the Magnetron
//! service.
//!
//! The canonical configuration lives in `magnetron.yaml` next to the
//! deployed binary. This module defines strongly-typed structs that
//! mirror the YAML structure and provides a loader that reads the file
//! and applies environment-variable overrides, so containerized
//! deployments can set connection strings and secrets without touching
//! the file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `magnetron.yaml`. All fields have sensible
/// defaults except the auth secret, which must be provided by the file
/// or by `APP_SECRET_KEY` at deploy time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server bind settings.
    #[serde(default)]
    pub server: ServerSection,

    /// State store connection settings.
    #[serde(default)]
    pub store: StoreSection,

    /// Bearer credential settings for the privileged cancel action.
    #[serde(default)]
    pub auth: AuthSection,

    /// Countdown ticker settings.
    #[serde(default)]
    pub ticker: TickerSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ServiceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override file values:
    /// - `REDIS_URL` overrides `store.redis_url`
    /// - `APP_SECRET_KEY` overrides `auth.secret_key`
    /// - `PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override file values with environment variables when set.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("REDIS_URL") {
            self.store.redis_url = val;
        }
        if let Ok(val) = std::env::var("APP_SECRET_KEY") {
            self.auth.secret_key = val;
        }
        if let Ok(val) = std::env::var("PORT") {
            if let Ok(port) = val.parse::<u16>() {
                self.server.port = port;
            }
        }
    }
}

/// HTTP server bind settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// State store connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreSection {
    /// Redis-compatible store URL.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Bound on every store command, in milliseconds. A command that
    /// cannot complete within it fails with a store-unavailable error.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl StoreSection {
    /// The command timeout as a [`Duration`].
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

/// Bearer credential settings for the privileged cancel action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthSection {
    /// Shared HS256 secret used to verify cancel credentials. Empty
    /// means unset; the service refuses to start without one.
    #[serde(default)]
    pub secret_key: String,
}

/// Countdown ticker settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TickerSection {
    /// Whether this instance participates in ticker leader election.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Real-time milliseconds between ticks (1000 in production).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Lease time-to-live in milliseconds. Should comfortably exceed
    /// the tick interval; defaults to three intervals.
    #[serde(default = "default_lease_ttl_ms")]
    pub lease_ttl_ms: u64,
}

impl TickerSection {
    /// The tick interval as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// The lease TTL as a [`Duration`].
    pub const fn lease_ttl(&self) -> Duration {
        Duration::from_millis(self.lease_ttl_ms)
    }
}

impl Default for TickerSection {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_ms: default_tick_interval_ms(),
            lease_ttl_ms: default_lease_ttl_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8000
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_owned()
}

const fn default_command_timeout_ms() -> u64 {
    2_000
}

const fn default_tick_interval_ms() -> u64 {
    1_000
}

const fn default_lease_ttl_ms() -> u64 {
    3_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
