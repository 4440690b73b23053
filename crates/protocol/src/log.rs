//! Log entry types
//!
//! `LogEntry` is the canonical, enriched form of a log line. Raw client input
//! is turned into a `LogEntry` by the ingestion pipeline; from then on the
//! record is never mutated.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How faithfully an entry reflects what the client sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryQuality {
    /// Structured object that passed validation
    #[default]
    Normal,
    /// Plain string or non-object payload stored as the message
    RawText,
    /// Structured object that failed validation, kept under `data.original`
    Malformed,
}

impl EntryQuality {
    /// Parse quality from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "raw-text" => Some(Self::RawText),
            "malformed" => Some(Self::Malformed),
            _ => None,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::RawText => "raw-text",
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for EntryQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single enriched log entry
///
/// Identity is `id`. Every entry in the live set has a non-empty `id`,
/// `message` and `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Unique id (`{sourceId}_{unixMillis}_{suffix}` when server-assigned)
    pub id: String,
    /// Log message
    pub message: String,
    /// Lowercase level drawn from the configured valid set
    pub level: String,
    /// Resolved event time
    pub time: DateTime<Utc>,
    /// Originating source
    pub source_id: String,
    /// Kind of source (e.g. "browser", "service")
    pub source_type: String,
    /// Version reported by the source
    pub source_version: String,
    /// Script/module that emitted the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_id: Option<String>,
    /// Arbitrary structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Validation outcome
    #[serde(default)]
    pub quality: EntryQuality,
    /// When the server accepted the entry
    pub server_received_at: DateTime<Utc>,
    /// `time` as Unix milliseconds (ordering key)
    pub timestamp: i64,
}

impl LogEntry {
    /// Check whether `needle` (already lowercased) occurs in the message or
    /// the serialized data payload
    pub fn contains_text(&self, needle: &str) -> bool {
        if self.message.to_lowercase().contains(needle) {
            return true;
        }

        match &self.data {
            Some(data) => data.to_string().to_lowercase().contains(needle),
            None => false,
        }
    }
}
