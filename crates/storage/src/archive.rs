//! Archive files
//!
//! Archives are always flat files, independent of the configured backend.
//! Names follow `archive_<bucket>.json` (or `.json.lz4` when compressed),
//! where the bucket is the rotation interval's calendar period. A name that
//! already exists gets a `_<n>` suffix; existing archives are never
//! overwritten.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use lz4_flex::frame::{FrameDecoder, FrameEncoder};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use pulse_config::RotationInterval;
use pulse_protocol::ArchiveDocument;

use crate::error::{Result, StorageError};

const PREFIX: &str = "archive_";
const JSON_EXT: &str = ".json";
const LZ4_EXT: &str = ".json.lz4";

/// Listing entry for one archive file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveInfo {
    pub name: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub compressed: bool,
}

/// Outcome of a retention sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Archives removed, oldest first
    pub deleted: Vec<String>,
    /// Archives that could not be removed
    pub failed: Vec<String>,
}

/// Calendar bucket for an interval, e.g. `2025-01-15` for daily
fn bucket(interval: RotationInterval, at: DateTime<Utc>) -> String {
    let format = match interval {
        RotationInterval::Hourly => "%Y-%m-%d_%H",
        RotationInterval::Daily => "%Y-%m-%d",
        RotationInterval::Weekly => "%G-W%V",
        RotationInterval::Monthly => "%Y-%m",
    };
    at.format(format).to_string()
}

/// Archive file name without the collision suffix
pub fn archive_base_name(interval: RotationInterval, at: DateTime<Utc>, compressed: bool) -> String {
    let ext = if compressed { LZ4_EXT } else { JSON_EXT };
    format!("{PREFIX}{}{ext}", bucket(interval, at))
}

fn with_suffix(base: &str, n: usize) -> String {
    match base.strip_suffix(LZ4_EXT) {
        Some(stem) => format!("{stem}_{n}{LZ4_EXT}"),
        None => {
            let stem = base.strip_suffix(JSON_EXT).unwrap_or(base);
            format!("{stem}_{n}{JSON_EXT}")
        }
    }
}

/// Check that `name` is a plain archive file name
fn validate_name(name: &str) -> Result<()> {
    let well_formed = name.starts_with(PREFIX)
        && (name.ends_with(JSON_EXT) || name.ends_with(LZ4_EXT))
        && !name.contains(['/', '\\'])
        && !name.contains("..");

    if well_formed {
        Ok(())
    } else {
        Err(StorageError::InvalidArchiveName(name.to_string()))
    }
}

fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = FrameEncoder::new(Vec::with_capacity(bytes.len() / 2));
    encoder
        .write_all(bytes)
        .map_err(|e| StorageError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| StorageError::Compression(e.to_string()))
}

fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = FrameDecoder::new(bytes);
    let mut out = Vec::with_capacity(bytes.len() * 2);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| StorageError::Compression(e.to_string()))?;
    Ok(out)
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Directory of sealed archive documents
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    dir: PathBuf,
    compress: bool,
}

impl ArchiveStore {
    pub fn new(dir: impl Into<PathBuf>, compress: bool) -> Self {
        Self {
            dir: dir.into(),
            compress,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `document` under a fresh name for `interval` at `at`
    pub async fn write(
        &self,
        document: &ArchiveDocument,
        interval: RotationInterval,
        at: DateTime<Utc>,
    ) -> Result<ArchiveInfo> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?;

        let json = serde_json::to_vec(document)?;
        let bytes = if self.compress { compress(&json)? } else { json };

        let base = archive_base_name(interval, at, self.compress);
        let mut name = base.clone();
        let mut attempt = 0;

        let mut file = loop {
            let path = self.dir.join(&name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => break file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    name = with_suffix(&base, attempt);
                }
                Err(e) => return Err(StorageError::io(path, e)),
            }
        };

        let path = self.dir.join(&name);
        let written = async {
            file.write_all(&bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            // Don't leave a truncated archive behind
            let _ = tokio::fs::remove_file(&path).await;
            return Err(StorageError::io(path, e));
        }

        info!(
            archive = %name,
            bytes = bytes.len(),
            logs = document.metadata.original_log_count,
            monitoring = document.metadata.original_monitoring_count,
            "Archive written"
        );

        Ok(ArchiveInfo {
            name,
            size: bytes.len() as u64,
            created: at,
            compressed: self.compress,
        })
    }

    /// All archives, oldest first
    pub async fn list(&self) -> Result<Vec<ArchiveInfo>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };

        let mut archives = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if validate_name(&name).is_err() {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    warn!(archive = %name, error = %e, "Failed to stat archive");
                    continue;
                }
            };

            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .map(to_utc)
                .unwrap_or_else(|_| Utc::now());

            archives.push(ArchiveInfo {
                compressed: name.ends_with(LZ4_EXT),
                name,
                size: metadata.len(),
                created,
            });
        }

        archives.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.name.cmp(&b.name)));
        Ok(archives)
    }

    /// Read one archive back, decoding LZ4 when needed
    pub async fn read(&self, name: &str) -> Result<ArchiveDocument> {
        validate_name(name)?;
        let path = self.dir.join(name);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::ArchiveNotFound(name.to_string()));
            }
            Err(e) => return Err(StorageError::io(path, e)),
        };

        let json = if name.ends_with(LZ4_EXT) {
            decompress(&bytes)?
        } else {
            bytes
        };

        Ok(serde_json::from_slice(&json)?)
    }

    /// Delete the oldest archives beyond `max_archives`
    ///
    /// A failed deletion is logged and the sweep continues.
    pub async fn prune(&self, max_archives: usize) -> Result<PruneReport> {
        let archives = self.list().await?;
        let mut report = PruneReport::default();

        if archives.len() <= max_archives {
            return Ok(report);
        }

        let excess = archives.len() - max_archives;
        for archive in archives.into_iter().take(excess) {
            let path = self.dir.join(&archive.name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(archive = %archive.name, "Archive pruned");
                    report.deleted.push(archive.name);
                }
                Err(e) => {
                    warn!(archive = %archive.name, error = %e, "Failed to prune archive");
                    report.failed.push(archive.name);
                }
            }
        }

        if !report.deleted.is_empty() {
            info!(
                deleted = report.deleted.len(),
                kept = max_archives,
                "Archive retention applied"
            );
        }
        Ok(report)
    }

    /// Creation time of the newest archive
    pub async fn latest_created(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.list().await?.last().map(|a| a.created))
    }
}

#[cfg(test)]
#[path = "archive_test.rs"]
mod tests;
