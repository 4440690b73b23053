use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pulse_protocol::{EntryQuality, LogEntry, MonitoringEntry, MonitoringKind};

use super::*;

fn log(id: &str, ts: i64, source: &str, level: &str, script: Option<&str>) -> Arc<LogEntry> {
    let time = Utc.timestamp_millis_opt(ts).unwrap();
    Arc::new(LogEntry {
        id: id.to_string(),
        message: format!("message {id}"),
        level: level.to_string(),
        time,
        source_id: source.to_string(),
        source_type: "service".to_string(),
        source_version: "1.0".to_string(),
        script_id: script.map(str::to_string),
        data: None,
        quality: EntryQuality::Normal,
        server_received_at: time,
        timestamp: ts,
    })
}

fn monitoring(id: &str, ts: i64, module: &str, kind: MonitoringKind, name: &str) -> Arc<MonitoringEntry> {
    Arc::new(MonitoringEntry {
        id: id.to_string(),
        module_id: module.to_string(),
        script_id: "main".to_string(),
        kind,
        name: name.to_string(),
        value: serde_json::json!(1),
        previous_value: None,
        timestamp: ts,
        time: Utc.timestamp_millis_opt(ts).unwrap(),
        source_id: "app".to_string(),
        metadata: serde_json::Value::Null,
    })
}

fn ids<T: Indexable>(entries: &[Arc<T>]) -> Vec<&str> {
    entries.iter().map(|e| e.id()).collect()
}

/// Every structure agrees with `by_id`
fn assert_consistent<T: Indexable>(index: &Index<T>) {
    assert_eq!(index.timeline().len(), index.len());
    for entry in index.timeline() {
        assert!(index.contains(entry.id()));
        for (dimension, key) in entry.index_keys() {
            let list = index.query_by_key(dimension, key);
            assert_eq!(list.iter().filter(|e| e.id() == entry.id()).count(), 1);
        }
    }
    let timeline = index.timeline();
    assert!(timeline.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
}

#[test]
fn test_insert_reaches_every_structure() {
    let mut index = Index::new();
    assert!(index.insert(log("1", 100, "app", "info", Some("main"))));

    assert_eq!(ids(index.query_by_key(Dimension::Source, "app")), vec!["1"]);
    assert_eq!(ids(index.query_by_key(Dimension::Level, "info")), vec!["1"]);
    assert_eq!(ids(index.query_by_key(Dimension::Script, "main")), vec!["1"]);
    assert_eq!(ids(index.query_time_range(100, 100)), vec!["1"]);
    assert!(index.get("1").is_some());
    assert_consistent(&index);
}

#[test]
fn test_entry_without_script_has_no_script_key() {
    let mut index = Index::new();
    index.insert(log("1", 100, "app", "info", None));

    assert!(index.key_counts(Dimension::Script).is_empty());
}

#[test]
fn test_duplicate_id_is_rejected() {
    let mut index = Index::new();
    assert!(index.insert(log("1", 100, "app", "info", None)));
    assert!(!index.insert(log("1", 200, "other", "error", None)));

    assert_eq!(index.len(), 1);
    assert!(index.query_by_key(Dimension::Source, "other").is_empty());
    assert_consistent(&index);
}

#[test]
fn test_key_lists_keep_arrival_order() {
    let mut index = Index::new();
    index.insert(log("late", 300, "app", "info", None));
    index.insert(log("early", 100, "app", "info", None));

    assert_eq!(
        ids(index.query_by_key(Dimension::Source, "app")),
        vec!["late", "early"]
    );
    assert_eq!(ids(index.timeline()), vec!["early", "late"]);
}

#[test]
fn test_remove_clears_every_structure() {
    let mut index = Index::new();
    index.insert(log("1", 100, "app", "info", Some("main")));
    index.insert(log("2", 200, "app", "error", None));

    let removed = index.remove("1").unwrap();
    assert_eq!(removed.id, "1");

    assert!(index.get("1").is_none());
    assert_eq!(ids(index.query_by_key(Dimension::Source, "app")), vec!["2"]);
    assert!(index.query_by_key(Dimension::Level, "info").is_empty());
    assert!(index.query_by_key(Dimension::Script, "main").is_empty());
    assert_eq!(ids(index.timeline()), vec!["2"]);
    assert_eq!(index.key_counts(Dimension::Level), vec![("error".to_string(), 1)]);
    assert_consistent(&index);
}

#[test]
fn test_remove_unknown_is_none() {
    let mut index: Index<LogEntry> = Index::new();
    assert!(index.remove("missing").is_none());
}

#[test]
fn test_time_range_query() {
    let mut index = Index::new();
    for (id, ts) in [("a", 100), ("b", 200), ("c", 300)] {
        index.insert(log(id, ts, "app", "info", None));
    }

    assert_eq!(ids(index.query_time_range(150, 300)), vec!["b", "c"]);
    assert!(index.query_time_range(300, 150).is_empty());
}

#[test]
fn test_rebuild_matches_incremental() {
    let entries = vec![
        log("1", 300, "app", "info", Some("main")),
        log("2", 100, "web", "error", None),
        log("3", 100, "app", "warn", Some("worker")),
        log("4", 200, "web", "info", Some("main")),
    ];

    let mut incremental = Index::new();
    for entry in &entries {
        incremental.insert(Arc::clone(entry));
    }

    let mut rebuilt = Index::new();
    rebuilt.insert(log("stale", 50, "gone", "debug", None));
    rebuilt.rebuild_all(&entries);

    assert!(rebuilt.get("stale").is_none());
    assert_eq!(ids(incremental.timeline()), ids(rebuilt.timeline()));
    assert_eq!(incremental.stats(), rebuilt.stats());
    for dimension in [Dimension::Source, Dimension::Level, Dimension::Script] {
        assert_eq!(incremental.key_counts(dimension), rebuilt.key_counts(dimension));
        for (key, _) in incremental.key_counts(dimension) {
            assert_eq!(
                ids(incremental.query_by_key(dimension, &key)),
                ids(rebuilt.query_by_key(dimension, &key))
            );
        }
    }
    assert_consistent(&rebuilt);
}

#[test]
fn test_monitoring_dimensions() {
    let mut index = Index::new();
    index.insert(monitoring("m1", 100, "auth", MonitoringKind::Variable, "count"));
    index.insert(monitoring("m2", 200, "auth", MonitoringKind::Event, "login"));
    index.insert(monitoring("m3", 300, "cart", MonitoringKind::Variable, "count"));

    assert_eq!(ids(index.query_by_key(Dimension::Module, "auth")), vec!["m1", "m2"]);
    assert_eq!(ids(index.query_by_key(Dimension::Kind, "variable")), vec!["m1", "m3"]);
    assert_eq!(ids(index.query_by_key(Dimension::Name, "count")), vec!["m1", "m3"]);
    assert_eq!(index.query_by_key(Dimension::Script, "main").len(), 3);
    assert_consistent(&index);
}

#[test]
fn test_stats() {
    let mut index = Index::new();
    index.insert(log("1", 100, "app", "info", None));
    index.insert(log("2", 200, "web", "info", None));

    let stats = index.stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.timeline_len, 2);
    assert_eq!(
        stats.distinct_keys,
        vec![(Dimension::Source, 2), (Dimension::Level, 1)]
    );
}
