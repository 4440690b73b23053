//! Flat-file backend
//!
//! The whole live state is one JSON [`LiveDocument`]. Saving a single
//! collection loads the document, replaces that collection and rewrites it;
//! writes go to a temp file that is renamed over the original.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use pulse_protocol::{LiveDocument, LogEntry, MonitoringEntry, Source};

use crate::backend::{LiveSnapshot, PersistenceBackend};
use crate::error::{Result, StorageError};

/// Single-document JSON backend
pub struct FileBackend {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<LiveDocument> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LiveDocument::default());
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(LiveDocument::default());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_document(&self, document: &LiveDocument) -> Result<()> {
        let bytes = serde_json::to_vec(document)?;
        let tmp = self.path.with_extension("tmp");

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Live document written");
        Ok(())
    }

    async fn modify<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut LiveDocument) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        apply(&mut document);
        document.timestamp = Utc::now();
        self.write_document(&document).await
    }
}

#[async_trait]
impl PersistenceBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }
        Ok(())
    }

    async fn save_logs(&self, logs: &[Arc<LogEntry>]) -> Result<()> {
        let logs = logs.to_vec();
        self.modify(move |doc| doc.logs = logs).await
    }

    async fn load_logs(&self) -> Result<Vec<Arc<LogEntry>>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_document().await?.logs)
    }

    async fn save_monitoring(&self, entries: &[Arc<MonitoringEntry>]) -> Result<()> {
        let entries = entries.to_vec();
        self.modify(move |doc| doc.monitoring_data = entries).await
    }

    async fn load_monitoring(&self) -> Result<Vec<Arc<MonitoringEntry>>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_document().await?.monitoring_data)
    }

    async fn save_sources(&self, sources: &[Source]) -> Result<()> {
        let sources = keyed_sources(sources);
        self.modify(move |doc| doc.sources = sources).await
    }

    async fn load_sources(&self) -> Result<Vec<Source>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_document().await?.source_records())
    }

    async fn save_all(&self, snapshot: &LiveSnapshot) -> Result<()> {
        let _guard = self.lock.lock().await;
        let document = LiveDocument {
            logs: snapshot.logs.clone(),
            monitoring_data: snapshot.monitoring.clone(),
            sources: keyed_sources(&snapshot.sources),
            timestamp: Utc::now(),
        };
        self.write_document(&document).await
    }

    async fn load_all(&self) -> Result<LiveSnapshot> {
        let _guard = self.lock.lock().await;
        let document = self.read_document().await?;
        Ok(LiveSnapshot {
            sources: document.source_records(),
            logs: document.logs,
            monitoring: document.monitoring_data,
        })
    }
}

fn keyed_sources(sources: &[Source]) -> Vec<(String, Source)> {
    sources
        .iter()
        .map(|s| (s.source_id.clone(), s.clone()))
        .collect()
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
