//! Persisted document layouts
//!
//! # Archive
//!
//! ```json
//! {
//!   "metadata": {"archivedAt": "...", "rotationInterval": "daily", "version": "1.0",
//!                "originalLogCount": 2, "originalMonitoringCount": 0},
//!   "logs": [...],
//!   "monitoringData": [...],
//!   "sources": [["app", {...}], ...]
//! }
//! ```
//!
//! Archives are sealed: written once, never mutated.
//!
//! # Live document
//!
//! The flat-file backend keeps the whole live state in one document:
//! `{logs, monitoringData, sources: [[id, record], ...], timestamp}`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::log::LogEntry;
use crate::monitoring::MonitoringEntry;
use crate::source::Source;

/// Current archive format version
pub const ARCHIVE_FORMAT_VERSION: &str = "1.0";

/// Archive header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveMetadata {
    pub archived_at: DateTime<Utc>,
    pub rotation_interval: String,
    pub version: String,
    pub original_log_count: usize,
    pub original_monitoring_count: usize,
}

/// A sealed snapshot of a rotated live set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveDocument {
    pub metadata: ArchiveMetadata,
    #[serde(default)]
    pub logs: Vec<Arc<LogEntry>>,
    #[serde(default)]
    pub monitoring_data: Vec<Arc<MonitoringEntry>>,
    #[serde(default)]
    pub sources: Vec<(String, Source)>,
}

impl ArchiveDocument {
    /// Build an archive from a live snapshot
    pub fn new(
        rotation_interval: impl Into<String>,
        archived_at: DateTime<Utc>,
        logs: Vec<Arc<LogEntry>>,
        monitoring_data: Vec<Arc<MonitoringEntry>>,
        sources: Vec<Source>,
    ) -> Self {
        Self {
            metadata: ArchiveMetadata {
                archived_at,
                rotation_interval: rotation_interval.into(),
                version: ARCHIVE_FORMAT_VERSION.to_string(),
                original_log_count: logs.len(),
                original_monitoring_count: monitoring_data.len(),
            },
            logs,
            monitoring_data,
            sources: sources
                .into_iter()
                .map(|s| (s.source_id.clone(), s))
                .collect(),
        }
    }
}

/// Whole live state as stored by the flat-file backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveDocument {
    #[serde(default)]
    pub logs: Vec<Arc<LogEntry>>,
    #[serde(default)]
    pub monitoring_data: Vec<Arc<MonitoringEntry>>,
    #[serde(default)]
    pub sources: Vec<(String, Source)>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Default for LiveDocument {
    fn default() -> Self {
        Self {
            logs: Vec::new(),
            monitoring_data: Vec::new(),
            sources: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

impl LiveDocument {
    /// Source records without their keys
    pub fn source_records(&self) -> Vec<Source> {
        self.sources.iter().map(|(_, s)| s.clone()).collect()
    }
}
