//! Ingestion metrics
//!
//! Atomic counters for tracking what the pipeline accepted and rejected.
//! All operations use relaxed ordering.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use pulse_protocol::EntryQuality;

/// Counters for the ingestion pipeline
///
/// These metrics are eventually consistent, not real-time. The stats view
/// reads them through [`IngestMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// Log entries inserted into the live set
    logs_accepted: AtomicU64,

    /// Monitoring entries inserted into the live set
    monitoring_accepted: AtomicU64,

    /// Submissions rejected by validation
    rejected: AtomicU64,

    /// Logs stored with `quality = malformed`
    malformed: AtomicU64,

    /// Logs stored with `quality = raw-text`
    raw_text: AtomicU64,

    /// Entries whose id was already live
    duplicates: AtomicU64,

    /// Entries pushed out by the live-set cap
    evicted: AtomicU64,

    /// Writes that did not reach any backend
    persistence_failures: AtomicU64,
}

impl IngestMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            logs_accepted: AtomicU64::new(0),
            monitoring_accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            raw_text: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            persistence_failures: AtomicU64::new(0),
        }
    }

    /// Record an accepted log entry
    #[inline]
    pub fn record_log(&self, quality: EntryQuality) {
        self.logs_accepted.fetch_add(1, Ordering::Relaxed);
        match quality {
            EntryQuality::Normal => {}
            EntryQuality::RawText => {
                self.raw_text.fetch_add(1, Ordering::Relaxed);
            }
            EntryQuality::Malformed => {
                self.malformed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record an accepted monitoring entry
    #[inline]
    pub fn record_monitoring(&self) {
        self.monitoring_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a validation rejection
    #[inline]
    pub fn record_rejected(&self, count: u64) {
        self.rejected.fetch_add(count, Ordering::Relaxed);
    }

    /// Record entries skipped because their id was already live
    #[inline]
    pub fn record_duplicates(&self, count: usize) {
        self.duplicates.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record entries evicted by the cap
    #[inline]
    pub fn record_evicted(&self, count: usize) {
        self.evicted.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a write that was lost on every backend
    #[inline]
    pub fn record_persistence_failure(&self) {
        self.persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    #[inline]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            logs_accepted: self.logs_accepted.load(Ordering::Relaxed),
            monitoring_accepted: self.monitoring_accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            raw_text: self.raw_text.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of ingestion metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub logs_accepted: u64,
    pub monitoring_accepted: u64,
    pub rejected: u64,
    pub malformed: u64,
    pub raw_text: u64,
    pub duplicates: u64,
    pub evicted: u64,
    pub persistence_failures: u64,
}

impl MetricsSnapshot {
    /// Total entries accepted across both kinds
    #[inline]
    pub fn accepted(&self) -> u64 {
        self.logs_accepted + self.monitoring_accepted
    }
}
