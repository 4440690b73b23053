//! Items flowing through the tap

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use pulse_protocol::{LogEntry, MonitoringEntry};

/// Which live set an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Log,
    Monitoring,
}

/// A published entry, shared with the live set
#[derive(Debug, Clone)]
pub enum TapItem {
    Log(Arc<LogEntry>),
    Monitoring(Arc<MonitoringEntry>),
}

impl TapItem {
    #[inline]
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Log(_) => ItemKind::Log,
            Self::Monitoring(_) => ItemKind::Monitoring,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        match self {
            Self::Log(e) => &e.id,
            Self::Monitoring(e) => &e.id,
        }
    }

    #[inline]
    pub fn source_id(&self) -> &str {
        match self {
            Self::Log(e) => &e.source_id,
            Self::Monitoring(e) => &e.source_id,
        }
    }

    #[inline]
    pub fn script_id(&self) -> Option<&str> {
        match self {
            Self::Log(e) => e.script_id.as_deref(),
            Self::Monitoring(e) => Some(&e.script_id),
        }
    }

    /// Level for logs; monitoring entries have none
    #[inline]
    pub fn level(&self) -> Option<&str> {
        match self {
            Self::Log(e) => Some(&e.level),
            Self::Monitoring(_) => None,
        }
    }
}

impl From<Arc<LogEntry>> for TapItem {
    fn from(entry: Arc<LogEntry>) -> Self {
        Self::Log(entry)
    }
}

impl From<Arc<MonitoringEntry>> for TapItem {
    fn from(entry: Arc<MonitoringEntry>) -> Self {
        Self::Monitoring(entry)
    }
}
