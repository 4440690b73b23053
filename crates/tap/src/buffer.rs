//! Ring buffer for stream replay
//!
//! The `ReplayBuffer` stores the last N published items in a fixed-size ring.
//! When a pull-stream subscriber connects it receives the most recent items
//! that pass its filter before the live stream starts.

use parking_lot::RwLock;

use crate::filter::TapFilter;
use crate::item::TapItem;

/// Default capacity for the replay buffer
const DEFAULT_CAPACITY: usize = 1000;

/// Maximum capacity to prevent memory issues
const MAX_CAPACITY: usize = 100_000;

/// Ring buffer for storing recent items
#[derive(Debug)]
pub struct ReplayBuffer {
    inner: RwLock<ReplayBufferInner>,
}

#[derive(Debug)]
struct ReplayBufferInner {
    buffer: Vec<Option<TapItem>>,
    /// Next write slot
    write_pos: usize,
    /// Items written since the last clear or compaction
    total_written: u64,
    capacity: usize,
}

impl ReplayBufferInner {
    fn len(&self) -> usize {
        self.total_written.min(self.capacity as u64) as usize
    }

    /// Slot index of the i-th newest item (0 = newest)
    fn newest(&self, i: usize) -> usize {
        (self.write_pos + self.capacity - 1 - i) % self.capacity
    }
}

impl ReplayBuffer {
    /// Create a new replay buffer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a replay buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_CAPACITY);
        Self {
            inner: RwLock::new(ReplayBufferInner {
                buffer: vec![None; capacity],
                write_pos: 0,
                total_written: 0,
                capacity,
            }),
        }
    }

    /// Push an item, overwriting the oldest when full
    pub fn push(&self, item: TapItem) {
        let mut inner = self.inner.write();
        let pos = inner.write_pos;
        inner.buffer[pos] = Some(item);
        inner.write_pos = (pos + 1) % inner.capacity;
        inner.total_written += 1;
    }

    /// Get the last N items (oldest first)
    pub fn last_n(&self, n: usize) -> Vec<TapItem> {
        self.last_n_matching(n, &TapFilter::new())
    }

    /// Get the newest `n` items passing `filter`, oldest first
    ///
    /// The filter is applied before the count, so a narrow filter still
    /// yields up to `n` items when the buffer holds them.
    pub fn last_n_matching(&self, n: usize, filter: &TapFilter) -> Vec<TapItem> {
        let inner = self.inner.read();
        let mut result = Vec::with_capacity(n.min(inner.len()));

        for i in 0..inner.len() {
            if result.len() == n {
                break;
            }
            if let Some(ref item) = inner.buffer[inner.newest(i)]
                && filter.matches(item)
            {
                result.push(item.clone());
            }
        }

        result.reverse();
        result
    }

    /// Get the total number of items written
    pub fn total_written(&self) -> u64 {
        self.inner.read().total_written
    }

    /// Get the current fill level
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get capacity
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity
    }

    /// Drop every item `keep` rejects; the rest stay in order
    ///
    /// Returns how many items were dropped.
    pub fn retain(&self, mut keep: impl FnMut(&TapItem) -> bool) -> usize {
        let mut inner = self.inner.write();
        let len = inner.len();

        let mut kept = Vec::with_capacity(len);
        for i in (0..len).rev() {
            let slot = inner.newest(i);
            if let Some(item) = inner.buffer[slot].take()
                && keep(&item)
            {
                kept.push(item);
            }
        }

        let removed = len - kept.len();
        inner.write_pos = kept.len() % inner.capacity;
        inner.total_written = kept.len() as u64;
        for (slot, item) in kept.into_iter().enumerate() {
            inner.buffer[slot] = Some(item);
        }
        removed
    }

    /// Clear the buffer
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        for slot in inner.buffer.iter_mut() {
            *slot = None;
        }
        inner.write_pos = 0;
        inner.total_written = 0;
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod tests;
