//! Pulse Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid config - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use pulse_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[ingest]\nmax_logs = 500").unwrap();
//! assert_eq!(config.ingest.max_logs, 500);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [server]
//! port = 3100
//!
//! [storage]
//! backend = "sqlite"
//! sqlite_path = "data/pulse.db"
//!
//! [rotation]
//! interval = "daily"
//! max_archives = 14
//! compress = true
//!
//! [rate_limit]
//! window_ms = 60000
//! max_requests = 1000
//! ```

mod error;
mod ingest;
mod logging;
mod rate_limit;
mod rotation;
mod server;
mod sources;
mod storage;
mod stream;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use ingest::{DEFAULT_VALID_LEVELS, IngestConfig};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use rate_limit::RateLimitConfig;
pub use rotation::{RotationConfig, RotationInterval};
pub use server::ServerConfig;
pub use sources::SourcesConfig;
pub use storage::{StorageBackendKind, StorageConfig};
pub use stream::StreamConfig;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Validation and live-set caps
    pub ingest: IngestConfig,

    /// Durable storage backend
    pub storage: StorageConfig,

    /// Rotation/archival scheduler
    pub rotation: RotationConfig,

    /// Per-source admission control
    pub rate_limit: RateLimitConfig,

    /// Fan-out (push/pull stream) settings
    pub stream: StreamConfig,

    /// Source registry maintenance
    pub sources: SourcesConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();

        assert_eq!(config.server.port, 3100);
        assert_eq!(config.ingest.max_logs, 10_000);
        assert_eq!(config.storage.backend, StorageBackendKind::File);
        assert_eq!(config.rotation.interval, RotationInterval::Daily);
        assert_eq!(config.rate_limit.max_requests, 1000);
        assert_eq!(config.stream.log_replay, 50);
        assert_eq!(config.stream.monitoring_replay, 20);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[log]
level = "debug"
format = "json"

[ingest]
max_logs = 3
max_monitoring_entries = 5
valid_levels = ["info", "error"]
accept_malformed = false

[storage]
backend = "postgres"
postgres_url = "postgres://pulse@localhost/pulse"

[rotation]
interval = "hourly"
poll_interval = "30s"
max_archives = 3
compress = true
archive_dir = "/var/lib/pulse/archives"

[rate_limit]
window_ms = 1000
max_requests = 5

[sources]
idle_timeout = "1h"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.ingest.max_logs, 3);
        assert_eq!(config.ingest.valid_levels, vec!["info", "error"]);
        assert!(!config.ingest.accept_malformed);
        assert_eq!(config.storage.backend, StorageBackendKind::Postgres);
        assert_eq!(config.rotation.interval, RotationInterval::Hourly);
        assert_eq!(config.rotation.poll_interval, Duration::from_secs(30));
        assert!(config.rotation.compress);
        assert_eq!(config.rate_limit.window_ms, 1000);
        assert_eq!(config.sources.idle_timeout, Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("[server\nport = 1");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_runs_on_parse() {
        let result = Config::from_str("[ingest]\nmax_logs = 0");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file("/nonexistent/pulse.toml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
