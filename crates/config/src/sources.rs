//! Source registry configuration

use std::time::Duration;

use serde::Deserialize;

/// Idle-source cleanup settings
///
/// ```toml
/// [sources]
/// idle_timeout = "24h"
/// cleanup_interval = "5m"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Sources silent for longer than this are removed
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,

    /// How often the cleanup pass runs
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(24 * 60 * 60),
            cleanup_interval: Duration::from_secs(5 * 60),
        }
    }
}
