//! Source registration records
//!
//! A `Source` is created on explicit registration or on the first entry that
//! references an unknown source id. `lastSeen` moves forward on every entry;
//! the cleanup pass removes sources idle beyond a configured threshold.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source id used when neither the payload nor the request names one
pub const DEFAULT_SOURCE_ID: &str = "unknown";

/// Registration record for an application pushing entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub source_id: String,
    pub source_type: String,
    pub source_version: String,
    #[serde(default)]
    pub metadata: Value,
    pub registered_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub log_count: u64,
    #[serde(default)]
    pub monitoring_count: u64,
}

impl Source {
    /// Create a fresh source record
    pub fn new(
        source_id: impl Into<String>,
        source_type: impl Into<String>,
        source_version: impl Into<String>,
        metadata: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            source_type: source_type.into(),
            source_version: source_version.into(),
            metadata,
            registered_at: now,
            last_seen: now,
            log_count: 0,
            monitoring_count: 0,
        }
    }

    /// Record a log entry from this source
    pub fn touch_log(&mut self, now: DateTime<Utc>) {
        self.log_count += 1;
        self.last_seen = self.last_seen.max(now);
    }

    /// Record a monitoring entry from this source
    pub fn touch_monitoring(&mut self, now: DateTime<Utc>) {
        self.monitoring_count += 1;
        self.last_seen = self.last_seen.max(now);
    }

    /// Check if the source has been silent for longer than `idle_timeout`
    pub fn is_idle(&self, now: DateTime<Utc>, idle_timeout: Duration) -> bool {
        now - self.last_seen > idle_timeout
    }
}
