//! Rotation/archival configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// How often the live set is flushed to an archive
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationInterval {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl RotationInterval {
    /// Fixed threshold in milliseconds (monthly is 30 days)
    pub fn as_millis(&self) -> i64 {
        const HOUR: i64 = 60 * 60 * 1000;
        match self {
            Self::Hourly => HOUR,
            Self::Daily => 24 * HOUR,
            Self::Weekly => 7 * 24 * HOUR,
            Self::Monthly => 30 * 24 * HOUR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Rotation settings
///
/// ```toml
/// [rotation]
/// interval = "daily"
/// poll_interval = "60s"
/// max_archives = 30
/// compress = false
/// archive_dir = "data/archives"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Run the background scheduler
    pub enabled: bool,

    /// Rotation interval
    pub interval: RotationInterval,

    /// How often the scheduler checks whether rotation is due
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Archives kept after pruning
    pub max_archives: usize,

    /// LZ4-compress archive files
    pub compress: bool,

    /// Directory holding archive files
    pub archive_dir: PathBuf,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: RotationInterval::Daily,
            poll_interval: Duration::from_secs(60),
            max_archives: 30,
            compress: false,
            archive_dir: PathBuf::from("data/archives"),
        }
    }
}
