//! Backend capability set

use std::sync::Arc;

use async_trait::async_trait;

use pulse_protocol::{LogEntry, MonitoringEntry, Source};

use crate::error::Result;

/// Result of an incremental write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The backend applied the change
    Handled,
    /// The backend has no incremental path; do a bulk save instead
    NotHandled,
}

/// Owned copy of the live state, taken without holding any lock
#[derive(Debug, Clone, Default)]
pub struct LiveSnapshot {
    pub logs: Vec<Arc<LogEntry>>,
    pub monitoring: Vec<Arc<MonitoringEntry>>,
    pub sources: Vec<Source>,
}

impl LiveSnapshot {
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty() && self.monitoring.is_empty() && self.sources.is_empty()
    }
}

/// View of the live state read while a durable write is in progress
///
/// [`Persistence`](crate::Persistence) only calls these while it holds its
/// write lock, so whatever they return is the newest state any write has seen.
pub trait LiveState: Send + Sync {
    /// Owned copy of every collection
    fn snapshot(&self) -> LiveSnapshot;

    fn holds_log(&self, id: &str) -> bool;

    fn holds_monitoring(&self, id: &str) -> bool;
}

impl LiveState for LiveSnapshot {
    fn snapshot(&self) -> LiveSnapshot {
        self.clone()
    }

    fn holds_log(&self, id: &str) -> bool {
        self.logs.iter().any(|e| e.id == id)
    }

    fn holds_monitoring(&self, id: &str) -> bool {
        self.monitoring.iter().any(|e| e.id == id)
    }
}

/// A durable store for the live state
///
/// Bulk `save_*` calls replace the whole collection. Incremental methods
/// default to [`WriteOutcome::NotHandled`].
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Backend name for logs and status
    fn name(&self) -> &'static str;

    /// Create directories, tables and indexes
    async fn initialize(&self) -> Result<()>;

    /// Release connections
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn save_logs(&self, logs: &[Arc<LogEntry>]) -> Result<()>;

    async fn load_logs(&self) -> Result<Vec<Arc<LogEntry>>>;

    async fn save_monitoring(&self, entries: &[Arc<MonitoringEntry>]) -> Result<()>;

    async fn load_monitoring(&self) -> Result<Vec<Arc<MonitoringEntry>>>;

    async fn save_sources(&self, sources: &[Source]) -> Result<()>;

    async fn load_sources(&self) -> Result<Vec<Source>>;

    /// Replace every collection
    async fn save_all(&self, snapshot: &LiveSnapshot) -> Result<()> {
        self.save_logs(&snapshot.logs).await?;
        self.save_monitoring(&snapshot.monitoring).await?;
        self.save_sources(&snapshot.sources).await
    }

    /// Load every collection
    async fn load_all(&self) -> Result<LiveSnapshot> {
        Ok(LiveSnapshot {
            logs: self.load_logs().await?,
            monitoring: self.load_monitoring().await?,
            sources: self.load_sources().await?,
        })
    }

    async fn add_log(&self, _entry: &LogEntry) -> Result<WriteOutcome> {
        Ok(WriteOutcome::NotHandled)
    }

    async fn add_monitoring_entry(&self, _entry: &MonitoringEntry) -> Result<WriteOutcome> {
        Ok(WriteOutcome::NotHandled)
    }

    /// Drop evicted logs by id
    async fn remove_logs(&self, _ids: &[String]) -> Result<WriteOutcome> {
        Ok(WriteOutcome::NotHandled)
    }

    /// Drop evicted monitoring entries by id
    async fn remove_monitoring(&self, _ids: &[String]) -> Result<WriteOutcome> {
        Ok(WriteOutcome::NotHandled)
    }

    /// Insert or update one source record
    async fn upsert_source(&self, _source: &Source) -> Result<WriteOutcome> {
        Ok(WriteOutcome::NotHandled)
    }
}
