//! Monitoring entry types
//!
//! A `MonitoringEntry` records one observation of a named variable, state,
//! function, property or event. Several entries may share the same
//! `(moduleId, scriptId, type, name)`; when projected into a structured view
//! the most recent observation wins.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a monitoring entry observes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitoringKind {
    Variable,
    State,
    Function,
    Property,
    Event,
}

impl MonitoringKind {
    /// All kinds, in display order
    pub const ALL: [MonitoringKind; 5] = [
        Self::Variable,
        Self::State,
        Self::Function,
        Self::Property,
        Self::Event,
    ];

    /// Parse kind from its wire name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "variable" => Some(Self::Variable),
            "state" => Some(Self::State),
            "function" => Some(Self::Function),
            "property" => Some(Self::Property),
            "event" => Some(Self::Event),
            _ => None,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::State => "state",
            Self::Function => "function",
            Self::Property => "property",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for MonitoringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single enriched monitoring observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringEntry {
    pub id: String,
    pub module_id: String,
    pub script_id: String,
    #[serde(rename = "type")]
    pub kind: MonitoringKind,
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
    /// Observation time in Unix milliseconds (ordering key)
    pub timestamp: i64,
    /// Observation time as RFC 3339
    pub time: DateTime<Utc>,
    pub source_id: String,
    #[serde(default)]
    pub metadata: Value,
}
