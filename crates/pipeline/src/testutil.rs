//! Builders shared by the pipeline tests

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

use pulse_config::{IngestConfig, StreamConfig};
use pulse_protocol::{EntryQuality, LogEntry, MonitoringEntry, MonitoringKind};
use pulse_storage::{FileBackend, Persistence};
use pulse_tap::TapPoint;

use crate::Pipeline;

pub fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

pub fn log(id: &str, ts: i64, source: &str, level: &str) -> Arc<LogEntry> {
    Arc::new(LogEntry {
        id: id.to_string(),
        message: format!("message {id}"),
        level: level.to_string(),
        time: at(ts),
        source_id: source.to_string(),
        source_type: "service".to_string(),
        source_version: "1.0".to_string(),
        script_id: Some("main.js".to_string()),
        data: None,
        quality: EntryQuality::Normal,
        server_received_at: at(ts),
        timestamp: ts,
    })
}

pub fn monitoring(
    id: &str,
    ts: i64,
    module: &str,
    kind: MonitoringKind,
    name: &str,
) -> Arc<MonitoringEntry> {
    Arc::new(MonitoringEntry {
        id: id.to_string(),
        module_id: module.to_string(),
        script_id: "main.js".to_string(),
        kind,
        name: name.to_string(),
        value: json!(ts),
        previous_value: None,
        timestamp: ts,
        time: at(ts),
        source_id: "app".to_string(),
        metadata: json!({}),
    })
}

pub fn ids<T: AsRef<str>>(items: impl IntoIterator<Item = T>) -> Vec<String> {
    items.into_iter().map(|s| s.as_ref().to_string()).collect()
}

/// Pipeline over a file backend in a fresh temp dir
pub struct Harness {
    pub dir: TempDir,
    pub pipeline: Arc<Pipeline>,
    pub tap: Arc<TapPoint>,
    pub persistence: Arc<Persistence>,
}

pub async fn harness(ingest: IngestConfig) -> Harness {
    let dir = TempDir::new().unwrap();
    let backend = FileBackend::new(dir.path().join("logs.json"));
    let persistence = Arc::new(Persistence::file_only(backend));
    let tap = Arc::new(TapPoint::new(&StreamConfig::default()));
    let pipeline = Arc::new(Pipeline::new(
        &ingest,
        Arc::clone(&persistence),
        Arc::clone(&tap),
    ));
    Harness {
        dir,
        pipeline,
        tap,
        persistence,
    }
}

pub fn capped(max_logs: usize, max_monitoring_entries: usize) -> IngestConfig {
    IngestConfig {
        max_logs,
        max_monitoring_entries,
        ..IngestConfig::default()
    }
}
