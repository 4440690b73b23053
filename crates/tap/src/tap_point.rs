//! TapPoint - the broadcast point for live streaming
//!
//! `TapPoint` is the integration point between the ingestion pipeline and
//! the stream transports. It provides:
//!
//! - Near-zero cost fan-out when no subscribers are connected
//! - Gap-free handover from replay to live stream
//! - Per-kind replay buffers for pull-stream late joiners
//! - Subscriptions that unsubscribe themselves on drop
//! - A maintenance task sweeping disconnected subscribers
//!
//! # Usage
//!
//! ```ignore
//! let tap = Arc::new(TapPoint::new(&config.stream));
//!
//! // After an entry is in the live set:
//! tap.publish(TapItem::Log(entry));
//!
//! // For new connections:
//! let mut sub = tap.subscribe(Transport::Pull, filter)?;
//! for item in sub.take_replay() { /* send */ }
//! while let Some(item) = sub.recv().await { /* send */ }
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use pulse_config::StreamConfig;

use crate::buffer::ReplayBuffer;
use crate::error::Result;
use crate::filter::TapFilter;
use crate::item::{ItemKind, TapItem};
use crate::subscriber::{SubscriberManager, Transport};

/// The main tap point for live streaming
#[derive(Debug)]
pub struct TapPoint {
    subscribers: SubscriberManager,
    log_replay: ReplayBuffer,
    monitoring_replay: ReplayBuffer,
    /// Replay sizes handed to pull subscribers
    log_replay_count: usize,
    monitoring_replay_count: usize,
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl TapPoint {
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            subscribers: SubscriberManager::new(config.max_subscribers, config.channel_buffer),
            log_replay: ReplayBuffer::with_capacity(config.replay_capacity),
            monitoring_replay: ReplayBuffer::with_capacity(config.replay_capacity),
            log_replay_count: config.log_replay,
            monitoring_replay_count: config.monitoring_replay,
            published: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Publish an item that is already in the live set
    pub fn publish(&self, item: TapItem) {
        self.published.fetch_add(1, Ordering::Relaxed);

        match item.kind() {
            ItemKind::Log => self.log_replay.push(item.clone()),
            ItemKind::Monitoring => self.monitoring_replay.push(item.clone()),
        }

        if !self.subscribers.has_subscribers() {
            return;
        }

        let outcome = self.subscribers.broadcast(&item);
        if outcome.delivered > 0 {
            self.delivered
                .fetch_add(outcome.delivered as u64, Ordering::Relaxed);
            trace!(delivered = outcome.delivered, id = item.id(), "published to subscribers");
        }
        if outcome.dropped > 0 {
            self.dropped
                .fetch_add(outcome.dropped as u64, Ordering::Relaxed);
            debug!(dropped = outcome.dropped, "subscriber channels full");
        }
    }

    /// Subscribe to the tap point
    ///
    /// Pull subscribers get the newest matching entries from the replay
    /// buffers (up to the configured log/monitoring counts) before the live
    /// stream.
    ///
    /// The subscriber is registered before the replay is read, so an item
    /// published in between reaches it at least once; [`Subscription::recv`]
    /// skips the copy that was already replayed.
    pub fn subscribe(
        self: &Arc<Self>,
        transport: Transport,
        filter: TapFilter,
    ) -> Result<Subscription> {
        let replay = match transport {
            Transport::Pull => Some(filter.clone()),
            Transport::Push => None,
        };
        let (id, receiver) = self.subscribers.subscribe(transport, filter)?;

        let replay = replay
            .map(|filter| self.replay_for(&filter))
            .unwrap_or_default();
        let replayed = replay.iter().map(|item| item.id().to_string()).collect();

        debug!(id, ?transport, replay = replay.len(), "new stream subscriber");

        Ok(Subscription {
            id,
            receiver,
            replay,
            replayed,
            tap: Arc::clone(self),
        })
    }

    fn replay_for(&self, filter: &TapFilter) -> Vec<TapItem> {
        let mut replay = Vec::new();
        if filter.accepts_kind(ItemKind::Log) {
            replay.extend(
                self.log_replay
                    .last_n_matching(self.log_replay_count, filter),
            );
        }
        if filter.accepts_kind(ItemKind::Monitoring) {
            replay.extend(
                self.monitoring_replay
                    .last_n_matching(self.monitoring_replay_count, filter),
            );
        }
        replay
    }

    /// Unsubscribe from the tap point
    pub fn unsubscribe(&self, id: u64) -> Result<()> {
        self.subscribers.unsubscribe(id)?;
        debug!(id, "stream subscriber removed");
        Ok(())
    }

    /// Replace a push subscriber's filter
    pub fn update_filter(&self, id: u64, filter: TapFilter) -> Result<()> {
        self.subscribers.update_filter(id, filter)
    }

    /// Forget every replayable item of one kind
    pub fn clear_replay(&self, kind: ItemKind) {
        self.replay(kind).clear();
    }

    /// Forget the replayable items of one kind that `keep` rejects
    ///
    /// Returns how many were dropped.
    pub fn retain_replay(&self, kind: ItemKind, keep: impl FnMut(&TapItem) -> bool) -> usize {
        self.replay(kind).retain(keep)
    }

    fn replay(&self, kind: ItemKind) -> &ReplayBuffer {
        match kind {
            ItemKind::Log => &self.log_replay,
            ItemKind::Monitoring => &self.monitoring_replay,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.count()
    }

    #[inline]
    pub fn has_subscribers(&self) -> bool {
        self.subscribers.has_subscribers()
    }

    pub fn stats(&self) -> TapStats {
        TapStats {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            push_subscribers: self.subscribers.count_by(Transport::Push),
            pull_subscribers: self.subscribers.count_by(Transport::Pull),
            log_replay_size: self.log_replay.len(),
            monitoring_replay_size: self.monitoring_replay.len(),
        }
    }

    /// Clean up disconnected subscribers
    ///
    /// Called periodically by the maintenance task.
    pub fn cleanup(&self) -> usize {
        let removed = self.subscribers.cleanup_disconnected();

        if removed > 0 {
            debug!(removed, "cleaned up disconnected subscribers");
        }

        removed
    }

    /// Spawn the maintenance task
    ///
    /// Sweeps disconnected subscribers every `interval` until cancelled.
    pub fn spawn_maintenance(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let tap = Arc::clone(self);

        tokio::spawn(async move {
            let mut cleanup_interval = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = cleanup_interval.tick() => {
                        tap.cleanup();
                    }
                }
            }

            debug!("tap maintenance stopped");
        })
    }
}

/// A live subscription
///
/// Dropping it removes the subscriber from the tap point.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: mpsc::Receiver<TapItem>,
    replay: Vec<TapItem>,
    /// Ids handed out in the replay that the channel may deliver again
    replayed: HashSet<String>,
    tap: Arc<TapPoint>,
}

impl Subscription {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Take the replay items (oldest first); empty on later calls
    pub fn take_replay(&mut self) -> Vec<TapItem> {
        std::mem::take(&mut self.replay)
    }

    /// Next live item; `None` once the tap point has dropped the subscriber
    pub async fn recv(&mut self) -> Option<TapItem> {
        loop {
            let item = self.receiver.recv().await?;
            if self.replayed.is_empty() || !self.replayed.remove(item.id()) {
                return Some(item);
            }
        }
    }

    /// Replace this subscription's filter
    pub fn update_filter(&self, filter: TapFilter) -> Result<()> {
        self.tap.update_filter(self.id, filter)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Already gone if a broadcast found the channel closed
        let _ = self.tap.unsubscribe(self.id);
    }
}

/// Statistics about the tap point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TapStats {
    /// Items published
    pub published: u64,
    /// Item deliveries to subscribers
    pub delivered: u64,
    /// Deliveries skipped because a channel was full
    pub dropped: u64,
    pub push_subscribers: usize,
    pub pull_subscribers: usize,
    pub log_replay_size: usize,
    pub monitoring_replay_size: usize,
}

#[cfg(test)]
#[path = "tap_point_test.rs"]
mod tests;
