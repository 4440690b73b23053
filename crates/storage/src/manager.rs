//! Backend selection and fallback policy
//!
//! The configured backend is the primary. The flat-file backend is always
//! initialized and takes over any operation the primary cannot complete.
//! Nothing here returns an error to ingestion: outcomes are logged and
//! counted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use pulse_config::{StorageBackendKind, StorageConfig};
use pulse_protocol::{LogEntry, MonitoringEntry, Source};

use crate::backend::{LiveSnapshot, LiveState, PersistenceBackend, WriteOutcome};
use crate::error::Result;
use crate::file::FileBackend;
use crate::postgres::PostgresBackend;
use crate::sqlite::SqliteBackend;

/// Counters exposed to the health view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceStats {
    /// Single-entry writes applied by the primary
    pub incremental_writes: u64,
    /// Whole-state saves that succeeded anywhere
    pub bulk_saves: u64,
    /// Operations redone against the flat file
    pub fallback_operations: u64,
    /// Operations that failed on the primary
    pub primary_failures: u64,
    /// Saves that failed on every backend
    pub lost_writes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    incremental_writes: AtomicU64,
    bulk_saves: AtomicU64,
    fallback_operations: AtomicU64,
    primary_failures: AtomicU64,
    lost_writes: AtomicU64,
}

enum Incremental<'a> {
    Log(&'a LogEntry),
    Monitoring(&'a MonitoringEntry),
}

/// Configured backend plus flat-file fallback
///
/// Every durable write runs under one async lock, in the order callers
/// acquire it.
pub struct Persistence {
    primary: Option<Arc<dyn PersistenceBackend>>,
    fallback: Arc<FileBackend>,
    write_lock: Mutex<()>,
    counters: Counters,
}

impl Persistence {
    /// Build from config
    ///
    /// Fails only when the flat-file fallback itself cannot be prepared. A
    /// primary that cannot connect or initialize is logged and skipped.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let fallback = FileBackend::new(config.file_path());
        fallback.initialize().await?;

        let primary = match config.backend {
            StorageBackendKind::File => None,
            StorageBackendKind::Sqlite => {
                activate(
                    "sqlite",
                    SqliteBackend::connect(&config.sqlite_path, config.max_connections).await,
                )
                .await
            }
            StorageBackendKind::Postgres => match config.postgres_url.as_deref() {
                Some(url) => {
                    activate(
                        "postgres",
                        PostgresBackend::connect(url, config.max_connections).await,
                    )
                    .await
                }
                None => {
                    warn!("No postgres_url configured, using file backend");
                    None
                }
            },
        };

        let persistence = Self::new(primary, fallback);
        info!(backend = persistence.backend_name(), "Persistence ready");
        Ok(persistence)
    }

    /// Assemble from already-initialized backends
    pub fn new(primary: Option<Arc<dyn PersistenceBackend>>, fallback: FileBackend) -> Self {
        Self {
            primary,
            fallback: Arc::new(fallback),
            write_lock: Mutex::new(()),
            counters: Counters::default(),
        }
    }

    /// File-only persistence
    pub fn file_only(fallback: FileBackend) -> Self {
        Self::new(None, fallback)
    }

    /// Name of the backend serving normal operations
    pub fn backend_name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map_or_else(|| self.fallback.name(), |p| p.name())
    }

    pub fn stats(&self) -> PersistenceStats {
        PersistenceStats {
            incremental_writes: self.counters.incremental_writes.load(Ordering::Relaxed),
            bulk_saves: self.counters.bulk_saves.load(Ordering::Relaxed),
            fallback_operations: self.counters.fallback_operations.load(Ordering::Relaxed),
            primary_failures: self.counters.primary_failures.load(Ordering::Relaxed),
            lost_writes: self.counters.lost_writes.load(Ordering::Relaxed),
        }
    }

    /// Load the live state
    ///
    /// Falls back to the file when the primary fails; an unreadable file
    /// yields an empty state.
    pub async fn load(&self) -> LiveSnapshot {
        if let Some(primary) = &self.primary {
            match primary.load_all().await {
                Ok(snapshot) => return snapshot,
                Err(e) => self.primary_failed(primary.name(), "load", &e),
            }
        }

        match self.fallback.load_all().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(
                    path = %self.fallback.path().display(),
                    error = %e,
                    "Failed to load live state, starting empty"
                );
                LiveSnapshot::default()
            }
        }
    }

    /// Replace the whole durable state with the current live state
    ///
    /// `live` is read after taking the write lock, so a save that waited
    /// never overwrites a newer one. Returns `false` when no backend accepted
    /// the write.
    pub async fn save_all(&self, live: &dyn LiveState) -> bool {
        let _guard = self.write_lock.lock().await;
        self.save_snapshot(&live.snapshot()).await
    }

    /// Persist one new log entry
    ///
    /// Tries the primary's incremental path first; anything short of full
    /// success falls back to a whole-state save of `live`. An entry that was
    /// evicted or archived before its turn came is not written.
    pub async fn persist_log(
        &self,
        entry: &LogEntry,
        evicted: &[String],
        source: Option<&Source>,
        live: &dyn LiveState,
    ) -> bool {
        let _guard = self.write_lock.lock().await;
        let current = live.holds_log(&entry.id);
        if self
            .try_incremental(Incremental::Log(entry), current, evicted, source)
            .await
        {
            return true;
        }
        self.save_snapshot(&live.snapshot()).await
    }

    /// Persist one new monitoring entry
    pub async fn persist_monitoring(
        &self,
        entry: &MonitoringEntry,
        evicted: &[String],
        source: Option<&Source>,
        live: &dyn LiveState,
    ) -> bool {
        let _guard = self.write_lock.lock().await;
        let current = live.holds_monitoring(&entry.id);
        if self
            .try_incremental(Incremental::Monitoring(entry), current, evicted, source)
            .await
        {
            return true;
        }
        self.save_snapshot(&live.snapshot()).await
    }

    /// Caller holds `write_lock`
    async fn save_snapshot(&self, snapshot: &LiveSnapshot) -> bool {
        if let Some(primary) = &self.primary {
            match primary.save_all(snapshot).await {
                Ok(()) => {
                    self.counters.bulk_saves.fetch_add(1, Ordering::Relaxed);
                    return true;
                }
                Err(e) => self.primary_failed(primary.name(), "save", &e),
            }
        }

        match self.fallback.save_all(snapshot).await {
            Ok(()) => {
                if self.primary.is_some() {
                    self.counters
                        .fallback_operations
                        .fetch_add(1, Ordering::Relaxed);
                }
                self.counters.bulk_saves.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                self.counters.lost_writes.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Failed to persist live state to any backend");
                false
            }
        }
    }

    async fn try_incremental(
        &self,
        entry: Incremental<'_>,
        current: bool,
        evicted: &[String],
        source: Option<&Source>,
    ) -> bool {
        let Some(primary) = &self.primary else {
            return false;
        };

        match apply_incremental(primary.as_ref(), entry, current, evicted, source).await {
            Ok(WriteOutcome::Handled) => {
                self.counters
                    .incremental_writes
                    .fetch_add(1, Ordering::Relaxed);
                true
            }
            Ok(WriteOutcome::NotHandled) => false,
            Err(e) => {
                self.primary_failed(primary.name(), "incremental write", &e);
                false
            }
        }
    }

    fn primary_failed(&self, backend: &str, operation: &str, error: &crate::StorageError) {
        self.counters
            .primary_failures
            .fetch_add(1, Ordering::Relaxed);
        warn!(
            backend,
            operation,
            error = %error,
            "Primary backend failed, falling back"
        );
    }

    /// Close every backend
    pub async fn close(&self) {
        if let Some(primary) = &self.primary
            && let Err(e) = primary.close().await
        {
            warn!(backend = primary.name(), error = %e, "Failed to close backend");
        }
        if let Err(e) = self.fallback.close().await {
            warn!(error = %e, "Failed to close file backend");
        }
    }
}

async fn apply_incremental(
    primary: &dyn PersistenceBackend,
    entry: Incremental<'_>,
    current: bool,
    evicted: &[String],
    source: Option<&Source>,
) -> Result<WriteOutcome> {
    let (added, removed) = match entry {
        Incremental::Log(_) if !current => (
            WriteOutcome::Handled,
            primary.remove_logs(evicted).await?,
        ),
        Incremental::Monitoring(_) if !current => (
            WriteOutcome::Handled,
            primary.remove_monitoring(evicted).await?,
        ),
        Incremental::Log(entry) => {
            let added = primary.add_log(entry).await?;
            let removed = if evicted.is_empty() || added == WriteOutcome::NotHandled {
                WriteOutcome::Handled
            } else {
                primary.remove_logs(evicted).await?
            };
            (added, removed)
        }
        Incremental::Monitoring(entry) => {
            let added = primary.add_monitoring_entry(entry).await?;
            let removed = if evicted.is_empty() || added == WriteOutcome::NotHandled {
                WriteOutcome::Handled
            } else {
                primary.remove_monitoring(evicted).await?
            };
            (added, removed)
        }
    };

    if added == WriteOutcome::NotHandled || removed == WriteOutcome::NotHandled {
        return Ok(WriteOutcome::NotHandled);
    }

    if let Some(source) = source {
        return primary.upsert_source(source).await;
    }
    Ok(WriteOutcome::Handled)
}

async fn activate<B>(name: &str, connected: Result<B>) -> Option<Arc<dyn PersistenceBackend>>
where
    B: PersistenceBackend + 'static,
{
    let backend = match connected {
        Ok(backend) => backend,
        Err(e) => {
            warn!(backend = name, error = %e, "Backend unavailable, using file backend");
            return None;
        }
    };

    if let Err(e) = backend.initialize().await {
        warn!(backend = name, error = %e, "Backend initialization failed, using file backend");
        let _ = backend.close().await;
        return None;
    }

    Some(Arc::new(backend))
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
