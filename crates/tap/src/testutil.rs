//! Item builders shared by the tap tests

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use pulse_protocol::{EntryQuality, LogEntry, MonitoringEntry, MonitoringKind};

use crate::TapItem;

pub fn log_item(id: &str, source: &str, level: &str) -> TapItem {
    let time = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    TapItem::Log(Arc::new(LogEntry {
        id: id.to_string(),
        message: format!("message {id}"),
        level: level.to_string(),
        time,
        source_id: source.to_string(),
        source_type: "service".to_string(),
        source_version: "1.0".to_string(),
        script_id: Some("main".to_string()),
        data: None,
        quality: EntryQuality::Normal,
        server_received_at: time,
        timestamp: time.timestamp_millis(),
    }))
}

pub fn monitoring_item(id: &str, source: &str, script: &str) -> TapItem {
    let time = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    TapItem::Monitoring(Arc::new(MonitoringEntry {
        id: id.to_string(),
        module_id: "auth".to_string(),
        script_id: script.to_string(),
        kind: MonitoringKind::State,
        name: "status".to_string(),
        value: json!("ready"),
        previous_value: None,
        timestamp: time.timestamp_millis(),
        time,
        source_id: source.to_string(),
        metadata: json!({}),
    }))
}

pub fn ids(items: &[TapItem]) -> Vec<&str> {
    items.iter().map(TapItem::id).collect()
}
