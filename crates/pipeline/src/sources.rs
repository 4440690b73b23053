//! Source registry
//!
//! Sources are created by explicit registration or by the first entry that
//! names an unknown id, touched by every entry, and dropped by the idle
//! cleanup pass.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use pulse_protocol::{LogEntry, MonitoringEntry, Source};

/// Explicit registration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub source_id: String,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub source_version: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Known sources keyed by id
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Source>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or update a source
    ///
    /// Re-registration refreshes type, version and metadata but keeps the
    /// original `registeredAt` and the entry counts.
    pub fn register(&mut self, registration: Registration, now: DateTime<Utc>) -> Source {
        let Registration {
            source_id,
            source_type,
            source_version,
            metadata,
        } = registration;

        let source = self
            .sources
            .entry(source_id.clone())
            .or_insert_with(|| Source::new(source_id, "unknown", "unknown", json!({}), now));

        if let Some(source_type) = source_type {
            source.source_type = source_type;
        }
        if let Some(source_version) = source_version {
            source.source_version = source_version;
        }
        if let Some(metadata) = metadata {
            source.metadata = metadata;
        }
        source.last_seen = source.last_seen.max(now);
        source.clone()
    }

    /// Count a log entry against its source, creating it when unknown
    pub fn touch_log(&mut self, entry: &LogEntry, now: DateTime<Utc>) -> Source {
        let source = self.sources.entry(entry.source_id.clone()).or_insert_with(|| {
            Source::new(
                entry.source_id.clone(),
                entry.source_type.clone(),
                entry.source_version.clone(),
                json!({}),
                now,
            )
        });
        source.touch_log(now);
        source.clone()
    }

    /// Count a monitoring entry against its source, creating it when unknown
    pub fn touch_monitoring(&mut self, entry: &MonitoringEntry, now: DateTime<Utc>) -> Source {
        let source = self.sources.entry(entry.source_id.clone()).or_insert_with(|| {
            Source::new(entry.source_id.clone(), "unknown", "unknown", json!({}), now)
        });
        source.touch_monitoring(now);
        source.clone()
    }

    pub fn get(&self, source_id: &str) -> Option<&Source> {
        self.sources.get(source_id)
    }

    /// All sources sorted by id
    pub fn list(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.sources.values().cloned().collect();
        sources.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        sources
    }

    /// Drop sources silent for longer than `idle_timeout`; returns their ids
    pub fn remove_idle(&mut self, now: DateTime<Utc>, idle_timeout: chrono::Duration) -> Vec<String> {
        let mut removed: Vec<String> = self
            .sources
            .values()
            .filter(|s| s.is_idle(now, idle_timeout))
            .map(|s| s.source_id.clone())
            .collect();
        removed.sort();
        for id in &removed {
            self.sources.remove(id);
        }
        removed
    }

    /// Replace every record, e.g. on startup load
    pub fn replace_all(&mut self, sources: Vec<Source>) {
        self.sources = sources
            .into_iter()
            .map(|s| (s.source_id.clone(), s))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{at, log, monitoring};
    use pulse_protocol::MonitoringKind;

    fn registration(id: &str) -> Registration {
        Registration {
            source_id: id.to_string(),
            source_type: Some("browser".to_string()),
            source_version: Some("2.0".to_string()),
            metadata: Some(json!({"tab": 1})),
        }
    }

    #[test]
    fn test_register_then_reregister_keeps_counts() {
        let mut registry = SourceRegistry::new();
        registry.register(registration("web"), at(1_000));
        registry.touch_log(&log("a", 1, "web", "info"), at(2_000));

        let mut update = registration("web");
        update.source_version = Some("2.1".to_string());
        let source = registry.register(update, at(3_000));

        assert_eq!(source.source_version, "2.1");
        assert_eq!(source.log_count, 1);
        assert_eq!(source.registered_at, at(1_000));
        assert_eq!(source.last_seen, at(3_000));
    }

    #[test]
    fn test_first_entry_creates_source() {
        let mut registry = SourceRegistry::new();
        let source = registry.touch_log(&log("a", 1, "api", "info"), at(500));
        assert_eq!(source.source_type, "service");
        assert_eq!(source.log_count, 1);

        let source = registry.touch_monitoring(
            &monitoring("m", 1, "cart", MonitoringKind::State, "open"),
            at(600),
        );
        assert_eq!(source.source_id, "app");
        assert_eq!(source.monitoring_count, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_idle() {
        let mut registry = SourceRegistry::new();
        registry.register(registration("old"), at(0));
        registry.register(registration("fresh"), at(9_000));

        let removed = registry.remove_idle(at(10_000), chrono::Duration::seconds(5));
        assert_eq!(removed, vec!["old".to_string()]);
        assert!(registry.get("old").is_none());
        assert!(registry.get("fresh").is_some());
    }

    #[test]
    fn test_list_sorted() {
        let mut registry = SourceRegistry::new();
        registry.register(registration("b"), at(0));
        registry.register(registration("a"), at(0));
        let ids: Vec<_> = registry.list().into_iter().map(|s| s.source_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
