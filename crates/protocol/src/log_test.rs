//! Tests for log entry serialization

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::{EntryQuality, LogEntry};

fn sample_entry() -> LogEntry {
    let time: DateTime<Utc> = "2025-01-15T10:30:45.123Z".parse().unwrap();
    LogEntry {
        id: "app_1736937045123_abc".into(),
        message: "request completed".into(),
        level: "info".into(),
        time,
        source_id: "app".into(),
        source_type: "service".into(),
        source_version: "1.2.0".into(),
        script_id: Some("auth".into()),
        data: Some(json!({"status": 200})),
        quality: EntryQuality::Normal,
        server_received_at: time,
        timestamp: time.timestamp_millis(),
    }
}

#[test]
fn test_serializes_camel_case() {
    let value = serde_json::to_value(sample_entry()).unwrap();

    assert_eq!(value["sourceId"], "app");
    assert_eq!(value["sourceType"], "service");
    assert_eq!(value["scriptId"], "auth");
    assert_eq!(value["quality"], "normal");
    assert!(value.get("serverReceivedAt").is_some());
    assert_eq!(value["timestamp"], 1736937045123i64);
}

#[test]
fn test_optional_fields_omitted() {
    let mut entry = sample_entry();
    entry.script_id = None;
    entry.data = None;

    let value = serde_json::to_value(entry).unwrap();
    assert!(value.get("scriptId").is_none());
    assert!(value.get("data").is_none());
}

#[test]
fn test_quality_wire_names() {
    let mut entry = sample_entry();
    entry.quality = EntryQuality::RawText;
    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(value["quality"], "raw-text");

    for quality in [
        EntryQuality::Normal,
        EntryQuality::RawText,
        EntryQuality::Malformed,
    ] {
        assert_eq!(EntryQuality::parse(quality.as_str()), Some(quality));
    }
    assert_eq!(EntryQuality::parse("garbage"), None);
}

#[test]
fn test_missing_quality_defaults_to_normal() {
    let mut value = serde_json::to_value(sample_entry()).unwrap();
    value.as_object_mut().unwrap().remove("quality");

    let entry: LogEntry = serde_json::from_value(value).unwrap();
    assert_eq!(entry.quality, EntryQuality::Normal);
}

#[test]
fn test_contains_text_searches_message_and_data() {
    let entry = sample_entry();

    assert!(entry.contains_text("completed"));
    assert!(entry.contains_text("status"));
    assert!(!entry.contains_text("timeout"));
}
