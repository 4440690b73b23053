//! Subscriber management for stream connections
//!
//! Each connected client gets a `Subscriber` that tracks:
//! - Unique ID for the connection
//! - Transport (push or pull)
//! - Filter criteria (replaceable for push streams)
//! - Channel sender for async delivery
//!
//! The `SubscriberManager` handles registration, removal, and fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{Result, TapError};
use crate::filter::TapFilter;
use crate::item::TapItem;

/// Counter for generating unique subscriber IDs
static SUBSCRIBER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Default maximum number of concurrent subscribers
pub const DEFAULT_MAX_SUBSCRIBERS: usize = 100;

/// Default channel buffer size per subscriber
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// How a subscriber is connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Bidirectional (WebSocket)
    Push,
    /// Server-initiated one-way (SSE)
    Pull,
}

/// A single stream subscriber (connected client)
#[derive(Debug)]
pub struct Subscriber {
    id: u64,
    transport: Transport,
    filter: RwLock<TapFilter>,
    sender: mpsc::Sender<TapItem>,
    /// Items dropped because the client's channel was full
    dropped: AtomicU64,
}

impl Subscriber {
    pub fn new(transport: Transport, filter: TapFilter, sender: mpsc::Sender<TapItem>) -> Self {
        Self {
            id: SUBSCRIBER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            transport,
            filter: RwLock::new(filter),
            sender,
            dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Current filter (cloned)
    pub fn filter(&self) -> TapFilter {
        self.filter.read().clone()
    }

    #[inline]
    pub fn matches(&self, item: &TapItem) -> bool {
        self.filter.read().matches(item)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Check if this subscriber is still connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Result of offering one item to every subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Subscribers that got the item
    pub delivered: usize,
    /// Matching subscribers whose channel was full
    pub dropped: usize,
    /// Subscribers found disconnected and removed
    pub removed: usize,
}

/// Manages all active subscribers
#[derive(Debug)]
pub struct SubscriberManager {
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
    /// Mirrors `subscribers.len()`; only written under its write lock
    active: AtomicUsize,
    max_subscribers: usize,
    channel_buffer: usize,
}

impl Default for SubscriberManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUBSCRIBERS, DEFAULT_CHANNEL_BUFFER)
    }
}

impl SubscriberManager {
    pub fn new(max_subscribers: usize, channel_buffer: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_subscribers,
            channel_buffer: channel_buffer.max(1),
        }
    }

    /// Register a new subscriber
    ///
    /// Returns the subscriber ID and receiver channel
    pub fn subscribe(
        &self,
        transport: Transport,
        filter: TapFilter,
    ) -> Result<(u64, mpsc::Receiver<TapItem>)> {
        let mut subscribers = self.subscribers.write();

        if subscribers.len() >= self.max_subscribers {
            return Err(TapError::MaxSubscribers {
                max: self.max_subscribers,
            });
        }

        let (sender, receiver) = mpsc::channel(self.channel_buffer);
        let subscriber = Arc::new(Subscriber::new(transport, filter, sender));

        let id = subscriber.id();
        subscribers.push(subscriber);
        self.active.store(subscribers.len(), Ordering::Release);

        Ok((id, receiver))
    }

    /// Unsubscribe by ID
    pub fn unsubscribe(&self, id: u64) -> Result<()> {
        let mut subscribers = self.subscribers.write();
        let original_len = subscribers.len();
        subscribers.retain(|s| s.id() != id);
        self.active.store(subscribers.len(), Ordering::Release);

        if subscribers.len() == original_len {
            return Err(TapError::SubscriberNotFound { id });
        }

        Ok(())
    }

    /// Replace a subscriber's filter
    pub fn update_filter(&self, id: u64, filter: TapFilter) -> Result<()> {
        let subscribers = self.subscribers.read();
        let subscriber = subscribers
            .iter()
            .find(|s| s.id() == id)
            .ok_or(TapError::SubscriberNotFound { id })?;

        *subscriber.filter.write() = filter;
        Ok(())
    }

    /// Get number of active subscribers
    pub fn count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Get number of active subscribers on a transport
    pub fn count_by(&self, transport: Transport) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|s| s.transport() == transport)
            .count()
    }

    /// Lock-free check for the publish path
    #[inline]
    pub fn has_subscribers(&self) -> bool {
        self.active.load(Ordering::Acquire) > 0
    }

    /// Offer an item to all matching subscribers
    ///
    /// One client's full or closed channel never affects delivery to the
    /// others. Closed clients are removed after the pass.
    pub fn broadcast(&self, item: &TapItem) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        let mut closed = false;

        {
            let subscribers = self.subscribers.read();
            for subscriber in subscribers.iter() {
                if !subscriber.matches(item) {
                    continue;
                }

                match subscriber.sender.try_send(item.clone()) {
                    Ok(()) => outcome.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        subscriber.dropped.fetch_add(1, Ordering::Relaxed);
                        outcome.dropped += 1;
                    }
                    Err(TrySendError::Closed(_)) => closed = true,
                }
            }
        }

        if closed {
            outcome.removed = self.cleanup_disconnected();
        }

        outcome
    }

    /// Clean up disconnected subscribers
    pub fn cleanup_disconnected(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let original_len = subscribers.len();
        subscribers.retain(|s| s.is_connected());
        self.active.store(subscribers.len(), Ordering::Release);
        original_len - subscribers.len()
    }
}

#[cfg(test)]
#[path = "subscriber_test.rs"]
mod tests;
