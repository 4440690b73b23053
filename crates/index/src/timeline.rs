//! Time-ordered sequence
//!
//! A `Vec` kept sorted by `timestamp` ascending. New entries go in at the
//! first position whose timestamp is strictly greater, so equal timestamps
//! keep arrival order and appends of in-order data stay O(1) amortized.

use std::sync::Arc;

use crate::Indexable;

/// Entries sorted by timestamp, ties in insertion order
#[derive(Debug)]
pub struct Timeline<T> {
    entries: Vec<Arc<T>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Indexable> Timeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert preserving order
    ///
    /// Returns the position the entry landed at.
    pub fn insert(&mut self, entry: Arc<T>) -> usize {
        let ts = entry.timestamp();
        let pos = self.entries.partition_point(|e| e.timestamp() <= ts);
        self.entries.insert(pos, entry);
        pos
    }

    /// Remove the entry with `id` at timestamp `ts`
    ///
    /// Only the run of equal timestamps is scanned.
    pub fn remove(&mut self, id: &str, ts: i64) -> Option<Arc<T>> {
        let lo = self.entries.partition_point(|e| e.timestamp() < ts);
        let hi = self.entries.partition_point(|e| e.timestamp() <= ts);

        let offset = self.entries[lo..hi].iter().position(|e| e.id() == id)?;
        Some(self.entries.remove(lo + offset))
    }

    /// Entries with `start <= timestamp <= end`, ascending
    ///
    /// An inverted range yields an empty slice.
    pub fn range(&self, start: i64, end: i64) -> &[Arc<T>] {
        if start > end {
            return &[];
        }

        let lo = self.entries.partition_point(|e| e.timestamp() < start);
        let hi = self.entries.partition_point(|e| e.timestamp() <= end);
        &self.entries[lo..hi]
    }

    pub fn as_slice(&self) -> &[Arc<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
