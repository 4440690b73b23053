//! Push-stream wire protocol
//!
//! WebSocket frames are JSON text objects tagged by `type`.
//!
//! # Client → Server
//!
//! - `{"type":"subscribe","filters":{"sources":["app"],"levels":["error"]}}`
//!   replaces the connection's filter (absent or empty lists match all)
//! - `{"type":"unsubscribe"}` clears the filter
//! - `{"type":"ping"}`
//!
//! # Server → Client
//!
//! - `{"type":"connected","clientId":7}` on accept
//! - `{"type":"log","data":{...}}` / `{"type":"monitoring","data":{...}}`
//! - `{"type":"subscribed","filters":{...}}` acknowledging a filter change
//! - `{"type":"pong"}`
//! - `{"type":"error","message":"..."}`

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use pulse_protocol::{LogEntry, MonitoringEntry};

use crate::error::{Result, TapError};
use crate::item::TapItem;

/// Filter body of a subscribe frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<String>>,
}

/// Frames sent by push-stream clients
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Subscribe {
        #[serde(default)]
        filters: SubscribeFilters,
    },
    Unsubscribe,
    Ping,
}

impl ClientMessage {
    /// Parse a text frame
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| TapError::Protocol(e.to_string()))
    }
}

/// Frames sent to push-stream clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Connected {
        #[serde(rename = "clientId")]
        client_id: u64,
    },
    Log {
        data: Arc<LogEntry>,
    },
    Monitoring {
        data: Arc<MonitoringEntry>,
    },
    Subscribed {
        filters: SubscribeFilters,
    },
    Pong,
    Error {
        message: String,
    },
}

impl ServerMessage {
    /// Encode as a JSON text frame
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<TapItem> for ServerMessage {
    fn from(item: TapItem) -> Self {
        match item {
            TapItem::Log(data) => Self::Log { data },
            TapItem::Monitoring(data) => Self::Monitoring { data },
        }
    }
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
