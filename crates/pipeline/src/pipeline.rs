//! The ingestion pipeline
//!
//! Every write follows the same order:
//!
//! 1. enrich (may fail with a validation error, nothing changed yet)
//! 2. mutate the live set and its index under the lock, no `.await`
//! 3. touch the source registry
//! 4. persist (incremental first, bulk fallback; never fails the caller).
//!    Persistence serializes its writes and reads the live state only once
//!    it holds its write lock, so the newest save always wins.
//! 5. publish to the tap
//!
//! so fan-out never sees an entry that is not live, and a slow backend can
//! delay a response but never leave the live set half-updated.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use pulse_config::IngestConfig;
use pulse_index::{Index, Indexable};
use pulse_protocol::{EntryQuality, LogEntry, MonitoringEntry, Source};
use pulse_storage::{LiveSnapshot, LiveState, Persistence};
use pulse_tap::{ItemKind, TapItem, TapPoint};

use crate::enrich::Enricher;
use crate::error::{PipelineError, Result};
use crate::live::{Admission, LiveSet};
use crate::metrics::{IngestMetrics, MetricsSnapshot};
use crate::query::{LogQuery, MonitoringQuery, Page};
use crate::sources::{Registration, SourceRegistry};
use crate::structure::{self, MonitoringStructure};

/// Acknowledgement for one accepted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accepted {
    pub id: String,
    /// The id was already live; the existing entry was kept
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<EntryQuality>,
}

/// Bulk import body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportRequest {
    pub logs: Vec<Value>,
    pub monitoring_data: Vec<Value>,
}

/// One rejected import item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportError {
    pub kind: &'static str,
    pub index: usize,
    pub error: String,
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub logs_imported: usize,
    pub monitoring_imported: usize,
    pub duplicates: usize,
    pub evicted: usize,
    pub errors: Vec<ImportError>,
}

/// What startup recovery loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub logs: usize,
    pub monitoring: usize,
    pub sources: usize,
    /// Entries dropped by the caps or as duplicates
    pub dropped: usize,
}

/// Index sizes for the stats view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub entries: usize,
    pub timeline: usize,
    /// Distinct keys per dimension
    pub keys: BTreeMap<&'static str, usize>,
}

impl<T: Indexable> From<&Index<T>> for IndexSummary {
    fn from(index: &Index<T>) -> Self {
        let stats = index.stats();
        Self {
            entries: stats.entries,
            timeline: stats.timeline_len,
            keys: stats
                .distinct_keys
                .into_iter()
                .map(|(dimension, count)| (dimension.as_str(), count))
                .collect(),
        }
    }
}

/// Live-set sizes and counters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub logs: usize,
    pub max_logs: usize,
    pub monitoring: usize,
    pub max_monitoring_entries: usize,
    pub sources: usize,
    pub log_index: IndexSummary,
    pub monitoring_index: IndexSummary,
    pub ingest: MetricsSnapshot,
}

/// Owns the live sets, their indexes and the source registry
pub struct Pipeline {
    logs: RwLock<LiveSet<LogEntry>>,
    monitoring: RwLock<LiveSet<MonitoringEntry>>,
    sources: RwLock<SourceRegistry>,
    enricher: Enricher,
    max_batch_size: usize,
    persistence: Arc<Persistence>,
    tap: Arc<TapPoint>,
    metrics: IngestMetrics,
}

impl Pipeline {
    pub fn new(config: &IngestConfig, persistence: Arc<Persistence>, tap: Arc<TapPoint>) -> Self {
        Self {
            logs: RwLock::new(LiveSet::new(config.max_logs)),
            monitoring: RwLock::new(LiveSet::new(config.max_monitoring_entries)),
            sources: RwLock::new(SourceRegistry::new()),
            enricher: Enricher::new(config),
            max_batch_size: config.max_batch_size,
            persistence,
            tap,
            metrics: IngestMetrics::new(),
        }
    }

    pub fn tap(&self) -> &Arc<TapPoint> {
        &self.tap
    }

    pub fn persistence(&self) -> &Arc<Persistence> {
        &self.persistence
    }

    // ========================================================================
    // Logs
    // ========================================================================

    /// Validate, enrich and add one log submission
    ///
    /// Invalid objects are degraded to `quality = malformed` when
    /// `accept_malformed` is on.
    pub async fn submit_log(&self, raw: Value, source_header: Option<&str>) -> Result<Accepted> {
        let entry = self
            .enricher
            .log_or_degrade(raw, source_header, Utc::now())
            .inspect_err(|_| self.metrics.record_rejected(1))?;
        Ok(self.add_log(entry).await)
    }

    /// Validate every item, then add them all; the first invalid item
    /// rejects the whole batch
    pub async fn submit_log_batch(
        &self,
        raws: Vec<Value>,
        source_header: Option<&str>,
    ) -> Result<Vec<Accepted>> {
        self.check_batch_size(raws.len())?;
        let now = Utc::now();
        let entries = raws
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                self.enricher
                    .log(raw, source_header, now)
                    .map_err(|e| PipelineError::BatchRejected {
                        index,
                        source: Box::new(e),
                    })
            })
            .collect::<Result<Vec<_>>>()
            .inspect_err(|_| self.metrics.record_rejected(1))?;

        Ok(self.add_log_batch(entries).await)
    }

    /// Add one enriched log entry
    pub async fn add_log(&self, entry: LogEntry) -> Accepted {
        let now = Utc::now();
        let entry = Arc::new(entry);

        let admission = self.logs.write().insert(Arc::clone(&entry));
        let Admission::Inserted { evicted } = admission else {
            return self.duplicate(&entry.id, Some(entry.quality));
        };
        self.metrics.record_log(entry.quality);
        self.metrics.record_evicted(evicted.len());
        let source = self.sources.write().touch_log(&entry, now);

        let evicted: Vec<String> = evicted.iter().map(|e| e.id.clone()).collect();
        let persisted = self
            .persistence
            .persist_log(&entry, &evicted, Some(&source), self)
            .await;
        if !persisted {
            self.metrics.record_persistence_failure();
        }

        self.tap.publish(TapItem::Log(Arc::clone(&entry)));
        Accepted {
            id: entry.id.clone(),
            duplicate: false,
            quality: Some(entry.quality),
        }
    }

    /// Add enriched log entries with one bulk save
    pub async fn add_log_batch(&self, entries: Vec<LogEntry>) -> Vec<Accepted> {
        let now = Utc::now();
        let mut accepted = Vec::with_capacity(entries.len());
        let mut inserted = Vec::new();

        {
            let mut logs = self.logs.write();
            for entry in entries {
                let entry = Arc::new(entry);
                match logs.insert(Arc::clone(&entry)) {
                    Admission::Inserted { evicted } => {
                        self.metrics.record_log(entry.quality);
                        self.metrics.record_evicted(evicted.len());
                        accepted.push(Accepted {
                            id: entry.id.clone(),
                            duplicate: false,
                            quality: Some(entry.quality),
                        });
                        inserted.push(entry);
                    }
                    Admission::Duplicate => {
                        accepted.push(self.duplicate(&entry.id, Some(entry.quality)));
                    }
                }
            }
        }

        {
            let mut sources = self.sources.write();
            for entry in &inserted {
                sources.touch_log(entry, now);
            }
        }

        if !inserted.is_empty() {
            self.save_or_count().await;
        }
        for entry in inserted {
            self.tap.publish(TapItem::Log(entry));
        }
        accepted
    }

    /// Remove live logs, optionally only those from one source
    pub async fn delete_logs(&self, source_id: Option<&str>) -> usize {
        let removed = {
            let mut logs = self.logs.write();
            match source_id {
                Some(source_id) => logs.retain(|e| e.source_id != source_id),
                None => logs.clear(),
            }
        };

        if removed > 0 {
            match source_id {
                Some(source_id) => {
                    self.tap
                        .retain_replay(ItemKind::Log, |item| item.source_id() != source_id);
                }
                None => self.tap.clear_replay(ItemKind::Log),
            }
            self.save_or_count().await;
        }
        info!(removed, source_id, "Deleted logs");
        removed
    }

    pub fn query_logs(&self, query: &LogQuery) -> Page<LogEntry> {
        query.run(self.logs.read().index())
    }

    pub fn log(&self, id: &str) -> Result<Arc<LogEntry>> {
        self.logs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::not_found("log", id))
    }

    // ========================================================================
    // Monitoring
    // ========================================================================

    pub async fn submit_monitoring(
        &self,
        raw: Value,
        source_header: Option<&str>,
    ) -> Result<Accepted> {
        let entry = self
            .enricher
            .monitoring(raw, source_header, Utc::now())
            .inspect_err(|_| self.metrics.record_rejected(1))?;
        Ok(self.add_monitoring(entry).await)
    }

    /// Fail-fast batch, as for logs
    pub async fn submit_monitoring_batch(
        &self,
        raws: Vec<Value>,
        source_header: Option<&str>,
    ) -> Result<Vec<Accepted>> {
        self.check_batch_size(raws.len())?;
        let now = Utc::now();
        let entries = raws
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                self.enricher
                    .monitoring(raw, source_header, now)
                    .map_err(|e| PipelineError::BatchRejected {
                        index,
                        source: Box::new(e),
                    })
            })
            .collect::<Result<Vec<_>>>()
            .inspect_err(|_| self.metrics.record_rejected(1))?;

        Ok(self.add_monitoring_batch(entries).await)
    }

    pub async fn add_monitoring(&self, entry: MonitoringEntry) -> Accepted {
        let now = Utc::now();
        let entry = Arc::new(entry);

        let admission = self.monitoring.write().insert(Arc::clone(&entry));
        let Admission::Inserted { evicted } = admission else {
            return self.duplicate(&entry.id, None);
        };
        self.metrics.record_monitoring();
        self.metrics.record_evicted(evicted.len());
        let source = self.sources.write().touch_monitoring(&entry, now);

        let evicted: Vec<String> = evicted.iter().map(|e| e.id.clone()).collect();
        let persisted = self
            .persistence
            .persist_monitoring(&entry, &evicted, Some(&source), self)
            .await;
        if !persisted {
            self.metrics.record_persistence_failure();
        }

        self.tap.publish(TapItem::Monitoring(Arc::clone(&entry)));
        Accepted {
            id: entry.id.clone(),
            duplicate: false,
            quality: None,
        }
    }

    pub async fn add_monitoring_batch(&self, entries: Vec<MonitoringEntry>) -> Vec<Accepted> {
        let now = Utc::now();
        let mut accepted = Vec::with_capacity(entries.len());
        let mut inserted = Vec::new();

        {
            let mut monitoring = self.monitoring.write();
            for entry in entries {
                let entry = Arc::new(entry);
                match monitoring.insert(Arc::clone(&entry)) {
                    Admission::Inserted { evicted } => {
                        self.metrics.record_monitoring();
                        self.metrics.record_evicted(evicted.len());
                        accepted.push(Accepted {
                            id: entry.id.clone(),
                            duplicate: false,
                            quality: None,
                        });
                        inserted.push(entry);
                    }
                    Admission::Duplicate => accepted.push(self.duplicate(&entry.id, None)),
                }
            }
        }

        {
            let mut sources = self.sources.write();
            for entry in &inserted {
                sources.touch_monitoring(entry, now);
            }
        }

        if !inserted.is_empty() {
            self.save_or_count().await;
        }
        for entry in inserted {
            self.tap.publish(TapItem::Monitoring(entry));
        }
        accepted
    }

    /// Remove live monitoring entries, optionally only one module's
    pub async fn delete_monitoring(&self, module_id: Option<&str>) -> usize {
        let removed = {
            let mut monitoring = self.monitoring.write();
            match module_id {
                Some(module_id) => monitoring.retain(|e| e.module_id != module_id),
                None => monitoring.clear(),
            }
        };

        if removed > 0 {
            match module_id {
                Some(module_id) => {
                    self.tap.retain_replay(ItemKind::Monitoring, |item| match item {
                        TapItem::Monitoring(entry) => entry.module_id != module_id,
                        TapItem::Log(_) => true,
                    });
                }
                None => self.tap.clear_replay(ItemKind::Monitoring),
            }
            self.save_or_count().await;
        }
        info!(removed, module_id, "Deleted monitoring entries");
        removed
    }

    pub fn query_monitoring(&self, query: &MonitoringQuery) -> Page<MonitoringEntry> {
        query.run(self.monitoring.read().index())
    }

    /// Latest observation per `module → script → kind → name`
    pub fn monitoring_structure(&self, source_id: Option<&str>) -> MonitoringStructure {
        let monitoring = self.monitoring.read();
        structure::project(monitoring.iter(), source_id)
    }

    // ========================================================================
    // Import
    // ========================================================================

    /// Best-effort bulk import
    ///
    /// Each item is validated on its own and failures are collected.
    /// Caller-supplied ids that are already live are skipped. The live sets
    /// are capped and re-indexed once, then saved once. Imported entries
    /// are not published to stream subscribers.
    pub async fn import(&self, request: ImportRequest, source_header: Option<&str>) -> ImportReport {
        let now = Utc::now();
        let mut report = ImportReport::default();

        let mut logs = Vec::with_capacity(request.logs.len());
        for (index, raw) in request.logs.into_iter().enumerate() {
            match self.enricher.log(raw, source_header, now) {
                Ok(entry) => logs.push(Arc::new(entry)),
                Err(e) => report.errors.push(ImportError {
                    kind: "log",
                    index,
                    error: e.to_string(),
                }),
            }
        }

        let mut monitoring = Vec::with_capacity(request.monitoring_data.len());
        for (index, raw) in request.monitoring_data.into_iter().enumerate() {
            match self.enricher.monitoring(raw, source_header, now) {
                Ok(entry) => monitoring.push(Arc::new(entry)),
                Err(e) => report.errors.push(ImportError {
                    kind: "monitoring",
                    index,
                    error: e.to_string(),
                }),
            }
        }
        self.metrics.record_rejected(report.errors.len() as u64);

        let log_outcome = self.logs.write().extend(logs.iter().cloned());
        let monitoring_outcome = self.monitoring.write().extend(monitoring.iter().cloned());

        {
            let imported_logs: HashSet<&str> =
                log_outcome.inserted.iter().map(String::as_str).collect();
            let imported_monitoring: HashSet<&str> =
                monitoring_outcome.inserted.iter().map(String::as_str).collect();
            let mut sources = self.sources.write();
            for entry in logs.iter().filter(|e| imported_logs.contains(e.id.as_str())) {
                sources.touch_log(entry, now);
                self.metrics.record_log(entry.quality);
            }
            for entry in monitoring
                .iter()
                .filter(|e| imported_monitoring.contains(e.id.as_str()))
            {
                sources.touch_monitoring(entry, now);
                self.metrics.record_monitoring();
            }
        }

        report.logs_imported = log_outcome.inserted.len();
        report.monitoring_imported = monitoring_outcome.inserted.len();
        report.duplicates = log_outcome.duplicates.len() + monitoring_outcome.duplicates.len();
        report.evicted = log_outcome.evicted + monitoring_outcome.evicted;
        self.metrics.record_duplicates(report.duplicates);
        self.metrics.record_evicted(report.evicted);

        if report.logs_imported + report.monitoring_imported > 0 {
            self.save_or_count().await;
        }

        info!(
            logs = report.logs_imported,
            monitoring = report.monitoring_imported,
            duplicates = report.duplicates,
            errors = report.errors.len(),
            "Import finished"
        );
        report
    }

    // ========================================================================
    // Sources
    // ========================================================================

    pub async fn register_source(&self, registration: Registration) -> Result<Source> {
        if registration.source_id.trim().is_empty() {
            return Err(PipelineError::validation("sourceId", "is required"));
        }

        let source = self.sources.write().register(registration, Utc::now());
        self.save_or_count().await;
        info!(source_id = %source.source_id, "Source registered");
        Ok(source)
    }

    pub fn sources(&self) -> Vec<Source> {
        self.sources.read().list()
    }

    pub fn source(&self, source_id: &str) -> Result<Source> {
        self.sources
            .read()
            .get(source_id)
            .cloned()
            .ok_or_else(|| PipelineError::not_found("source", source_id))
    }

    /// Drop sources idle for longer than `idle_timeout`
    pub async fn cleanup_idle_sources(&self, now: DateTime<Utc>, idle_timeout: chrono::Duration) -> usize {
        let removed = self.sources.write().remove_idle(now, idle_timeout);
        if removed.is_empty() {
            return 0;
        }

        debug!(sources = ?removed, "Removed idle sources");
        self.save_or_count().await;
        removed.len()
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Copy of the whole live state
    ///
    /// Locks are taken in the order logs, monitoring, sources.
    pub fn snapshot(&self) -> LiveSnapshot {
        let logs = self.logs.read();
        let monitoring = self.monitoring.read();
        LiveSnapshot {
            logs: logs.snapshot(),
            monitoring: monitoring.snapshot(),
            sources: self.sources.read().list(),
        }
    }

    /// Drop exactly the entries captured by an archive snapshot
    ///
    /// Entries that arrived after the snapshot stay live, in the live sets
    /// and in the stream replay. Returns how many logs and monitoring entries
    /// were removed.
    pub fn clear_archived(&self, archived: &LiveSnapshot) -> (usize, usize) {
        let log_ids: HashSet<String> = archived.logs.iter().map(|e| e.id.clone()).collect();
        let monitoring_ids: HashSet<String> =
            archived.monitoring.iter().map(|e| e.id.clone()).collect();

        let removed = {
            let mut logs = self.logs.write();
            let mut monitoring = self.monitoring.write();
            (
                logs.remove_ids(&log_ids),
                monitoring.remove_ids(&monitoring_ids),
            )
        };

        self.tap
            .retain_replay(ItemKind::Log, |item| !log_ids.contains(item.id()));
        self.tap
            .retain_replay(ItemKind::Monitoring, |item| !monitoring_ids.contains(item.id()));
        removed
    }

    /// Load the persisted live state, replacing what is in memory
    pub async fn load(&self) -> LoadReport {
        let snapshot = self.persistence.load().await;
        let mut report = LoadReport {
            logs: snapshot.logs.len(),
            monitoring: snapshot.monitoring.len(),
            sources: snapshot.sources.len(),
            dropped: 0,
        };

        report.dropped += self.logs.write().replace_all(snapshot.logs);
        report.dropped += self.monitoring.write().replace_all(snapshot.monitoring);
        self.sources.write().replace_all(snapshot.sources);

        if report.dropped > 0 {
            warn!(dropped = report.dropped, "Loaded state exceeded live-set caps");
        }
        info!(
            logs = report.logs,
            monitoring = report.monitoring,
            sources = report.sources,
            "Live state loaded"
        );
        report
    }

    /// Save the whole live state
    pub async fn save(&self) -> bool {
        self.save_or_count().await
    }

    pub fn stats(&self) -> PipelineStats {
        let (logs, max_logs, log_index) = {
            let logs = self.logs.read();
            (logs.len(), logs.cap(), IndexSummary::from(logs.index()))
        };
        let (monitoring, max_monitoring_entries, monitoring_index) = {
            let monitoring = self.monitoring.read();
            (
                monitoring.len(),
                monitoring.cap(),
                IndexSummary::from(monitoring.index()),
            )
        };

        PipelineStats {
            logs,
            max_logs,
            monitoring,
            max_monitoring_entries,
            sources: self.sources.read().len(),
            log_index,
            monitoring_index,
            ingest: self.metrics.snapshot(),
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn check_batch_size(&self, size: usize) -> Result<()> {
        if size > self.max_batch_size {
            self.metrics.record_rejected(1);
            return Err(PipelineError::BatchTooLarge {
                size,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }

    fn duplicate(&self, id: &str, quality: Option<EntryQuality>) -> Accepted {
        self.metrics.record_duplicates(1);
        debug!(id, "Duplicate entry id, keeping the live entry");
        Accepted {
            id: id.to_string(),
            duplicate: true,
            quality,
        }
    }

    async fn save_or_count(&self) -> bool {
        let saved = self.persistence.save_all(self).await;
        if !saved {
            self.metrics.record_persistence_failure();
        }
        saved
    }
}

impl LiveState for Pipeline {
    fn snapshot(&self) -> LiveSnapshot {
        Pipeline::snapshot(self)
    }

    fn holds_log(&self, id: &str) -> bool {
        self.logs.read().get(id).is_some()
    }

    fn holds_monitoring(&self, id: &str) -> bool {
        self.monitoring.read().get(id).is_some()
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
