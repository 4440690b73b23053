//! Rotation/archival scheduler
//!
//! ```text
//!   Idle ──(now - lastRotation > interval)──▶ Due ──poll──▶ Archiving ──▶ Idle
//!                                                  ▲
//!                         manual trigger ──────────┘
//! ```
//!
//! A rotation snapshots the live state, writes it as one sealed archive,
//! drops exactly the snapshotted entries, saves the remaining live state and
//! prunes old archives. A failed archive write leaves the live set alone;
//! the next poll tries again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use pulse_config::{RotationConfig, RotationInterval};
use pulse_protocol::ArchiveDocument;
use pulse_storage::{ArchiveInfo, ArchiveStore};

use crate::error::{PipelineError, Result};
use crate::pipeline::Pipeline;

/// Scheduler state as reported to the health view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationState {
    Idle,
    Due,
    Archiving,
}

/// Why a rotation ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationTrigger {
    Scheduled,
    Manual,
}

/// Outcome of one rotation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationReport {
    pub trigger: RotationTrigger,
    pub archive: ArchiveInfo,
    pub logs_archived: usize,
    pub monitoring_archived: usize,
    /// Archives removed by the retention sweep
    pub pruned: Vec<String>,
}

/// Read-only scheduler view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationStatus {
    pub enabled: bool,
    pub state: RotationState,
    pub interval: &'static str,
    pub last_rotation: DateTime<Utc>,
    pub next_due: DateTime<Utc>,
    pub archive_count: usize,
    pub max_archives: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_archive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct History {
    last_rotation: DateTime<Utc>,
    last_archive: Option<String>,
    last_error: Option<String>,
}

/// Clears the archiving flag even if the rotation future is dropped
struct ArchivingGuard<'a>(&'a AtomicBool);

impl Drop for ArchivingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodically flushes the live set to archives
pub struct RotationScheduler {
    pipeline: Arc<Pipeline>,
    archives: ArchiveStore,
    enabled: bool,
    interval: RotationInterval,
    poll_interval: Duration,
    max_archives: usize,
    archiving: AtomicBool,
    history: Mutex<History>,
}

impl RotationScheduler {
    /// Create a scheduler whose clock starts at `last_rotation`
    pub fn new(
        pipeline: Arc<Pipeline>,
        archives: ArchiveStore,
        config: &RotationConfig,
        last_rotation: DateTime<Utc>,
    ) -> Self {
        Self {
            pipeline,
            archives,
            enabled: config.enabled,
            interval: config.interval,
            poll_interval: config.poll_interval,
            max_archives: config.max_archives,
            archiving: AtomicBool::new(false),
            history: Mutex::new(History {
                last_rotation,
                last_archive: None,
                last_error: None,
            }),
        }
    }

    /// Create a scheduler, starting the clock at the newest archive's
    /// creation time (or now when there is none)
    pub async fn recover(
        pipeline: Arc<Pipeline>,
        archives: ArchiveStore,
        config: &RotationConfig,
    ) -> Self {
        let last_rotation = match archives.latest_created().await {
            Ok(Some(created)) => created,
            Ok(None) => Utc::now(),
            Err(e) => {
                warn!(error = %e, "Failed to list archives, rotation clock starts now");
                Utc::now()
            }
        };
        debug!(%last_rotation, "Rotation clock initialized");
        Self::new(pipeline, archives, config, last_rotation)
    }

    pub fn archives(&self) -> &ArchiveStore {
        &self.archives
    }

    pub fn last_rotation(&self) -> DateTime<Utc> {
        self.history.lock().last_rotation
    }

    /// Strictly more than one interval since the last rotation
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        (now - self.last_rotation()).num_milliseconds() > self.interval.as_millis()
    }

    pub fn state(&self, now: DateTime<Utc>) -> RotationState {
        if self.archiving.load(Ordering::Acquire) {
            RotationState::Archiving
        } else if self.is_due(now) {
            RotationState::Due
        } else {
            RotationState::Idle
        }
    }

    /// Rotate now, regardless of whether rotation is due
    ///
    /// Fails with `RotationInProgress` if another rotation is running.
    pub async fn rotate(&self, trigger: RotationTrigger) -> Result<RotationReport> {
        if self
            .archiving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PipelineError::RotationInProgress);
        }

        let _guard = ArchivingGuard(&self.archiving);
        self.archive_live_set(trigger).await
    }

    async fn archive_live_set(&self, trigger: RotationTrigger) -> Result<RotationReport> {
        let now = Utc::now();
        let snapshot = self.pipeline.snapshot();
        let document = ArchiveDocument::new(
            self.interval.as_str(),
            now,
            snapshot.logs.clone(),
            snapshot.monitoring.clone(),
            snapshot.sources.clone(),
        );

        let archive = match self.archives.write(&document, self.interval, now).await {
            Ok(info) => info,
            Err(e) => {
                error!(error = %e, ?trigger, "Archive write failed, live set kept");
                self.history.lock().last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let (logs_archived, monitoring_archived) = self.pipeline.clear_archived(&snapshot);
        {
            let mut history = self.history.lock();
            history.last_rotation = now;
            history.last_archive = Some(archive.name.clone());
            history.last_error = None;
        }
        self.pipeline.save().await;

        let pruned = match self.archives.prune(self.max_archives).await {
            Ok(report) => {
                for name in &report.failed {
                    warn!(archive = %name, "Failed to delete old archive");
                }
                report.deleted
            }
            Err(e) => {
                warn!(error = %e, "Retention sweep failed");
                Vec::new()
            }
        };

        info!(
            archive = %archive.name,
            logs = logs_archived,
            monitoring = monitoring_archived,
            pruned = pruned.len(),
            ?trigger,
            "Rotation complete"
        );

        Ok(RotationReport {
            trigger,
            archive,
            logs_archived,
            monitoring_archived,
            pruned,
        })
    }

    /// One scheduler tick: rotate if due
    ///
    /// A due rotation with nothing live only restarts the clock.
    pub async fn poll(&self) -> Option<Result<RotationReport>> {
        let now = Utc::now();
        if !self.is_due(now) {
            return None;
        }

        let stats = self.pipeline.stats();
        if stats.logs == 0 && stats.monitoring == 0 {
            debug!("Rotation due with empty live set, skipping archive");
            self.history.lock().last_rotation = now;
            return None;
        }

        Some(self.rotate(RotationTrigger::Scheduled).await)
    }

    /// Run the poll loop until cancelled
    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            if !scheduler.enabled {
                info!("Rotation scheduler disabled");
                return;
            }

            let mut ticker = tokio::time::interval(scheduler.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(
                interval = scheduler.interval.as_str(),
                poll_secs = scheduler.poll_interval.as_secs(),
                "Rotation scheduler started"
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        match scheduler.poll().await {
                            Some(Err(PipelineError::RotationInProgress)) => {
                                debug!("Rotation already running, skipping tick");
                            }
                            Some(Err(e)) => warn!(error = %e, "Scheduled rotation failed"),
                            Some(Ok(_)) | None => {}
                        }
                    }
                }
            }
            debug!("Rotation scheduler stopped");
        })
    }

    pub async fn status(&self) -> RotationStatus {
        let now = Utc::now();
        let archive_count = match self.archives.list().await {
            Ok(list) => list.len(),
            Err(e) => {
                warn!(error = %e, "Failed to list archives");
                0
            }
        };
        let (last_rotation, last_archive, last_error) = {
            let history = self.history.lock();
            (
                history.last_rotation,
                history.last_archive.clone(),
                history.last_error.clone(),
            )
        };
        let next_due = last_rotation
            .checked_add_signed(chrono::Duration::milliseconds(self.interval.as_millis()))
            .unwrap_or(last_rotation);

        RotationStatus {
            enabled: self.enabled,
            state: self.state(now),
            interval: self.interval.as_str(),
            last_rotation,
            next_due,
            archive_count,
            max_archives: self.max_archives,
            last_archive,
            last_error,
        }
    }
}

#[cfg(test)]
#[path = "rotation_test.rs"]
mod tests;
