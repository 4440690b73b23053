//! Ingestion configuration
//!
//! Validation rules and live-set caps.

use serde::Deserialize;

/// Levels accepted when `valid_levels` is not configured
pub const DEFAULT_VALID_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "fatal"];

/// Ingestion settings
///
/// ```toml
/// [ingest]
/// max_logs = 10000
/// max_monitoring_entries = 10000
/// valid_levels = ["debug", "info", "warn", "error"]
/// accept_malformed = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Live log set cap; the oldest entry is evicted past this size
    pub max_logs: usize,

    /// Live monitoring set cap
    pub max_monitoring_entries: usize,

    /// Accepted log levels (compared lowercase)
    pub valid_levels: Vec<String>,

    /// Store invalid structured logs as `quality = malformed` instead of
    /// rejecting them (single-entry ingestion only)
    pub accept_malformed: bool,

    /// Maximum number of items in one batch request
    pub max_batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_logs: 10_000,
            max_monitoring_entries: 10_000,
            valid_levels: DEFAULT_VALID_LEVELS.iter().map(|s| s.to_string()).collect(),
            accept_malformed: true,
            max_batch_size: 1000,
        }
    }
}

impl IngestConfig {
    /// Check whether `level` (any case) is in the valid set
    pub fn is_valid_level(&self, level: &str) -> bool {
        self.valid_levels
            .iter()
            .any(|valid| valid.eq_ignore_ascii_case(level))
    }
}
