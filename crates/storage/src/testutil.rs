//! Entry builders shared by the storage tests

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use pulse_protocol::{EntryQuality, LogEntry, MonitoringEntry, MonitoringKind, Source};

use crate::LiveSnapshot;

pub fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

pub fn log(id: &str, ts: i64) -> Arc<LogEntry> {
    Arc::new(LogEntry {
        id: id.to_string(),
        message: format!("message {id}"),
        level: "info".to_string(),
        time: at(ts),
        source_id: "app".to_string(),
        source_type: "service".to_string(),
        source_version: "1.2.0".to_string(),
        script_id: Some("main".to_string()),
        data: Some(json!({"user": 42, "tags": ["a", "b"]})),
        quality: EntryQuality::Normal,
        server_received_at: at(ts + 5),
        timestamp: ts,
    })
}

pub fn monitoring(id: &str, ts: i64) -> Arc<MonitoringEntry> {
    Arc::new(MonitoringEntry {
        id: id.to_string(),
        module_id: "auth".to_string(),
        script_id: "main".to_string(),
        kind: MonitoringKind::Variable,
        name: "sessions".to_string(),
        value: json!(3),
        previous_value: Some(json!(2)),
        timestamp: ts,
        time: at(ts),
        source_id: "app".to_string(),
        metadata: json!({}),
    })
}

pub fn source(id: &str) -> Source {
    let mut source = Source::new(id, "service", "1.2.0", json!({"region": "eu"}), at(1_000));
    source.touch_log(at(2_000));
    source
}

pub fn snapshot() -> LiveSnapshot {
    LiveSnapshot {
        logs: vec![log("l1", 1_000), log("l2", 2_000)],
        monitoring: vec![monitoring("m1", 1_500)],
        sources: vec![source("app")],
    }
}

pub fn ids<T: AsRef<str>>(items: impl IntoIterator<Item = T>) -> Vec<String> {
    items.into_iter().map(|s| s.as_ref().to_string()).collect()
}
