//! Multi-key index
//!
//! `Index<T>` is not synchronized; the owner wraps it (together with the
//! live set it mirrors) in a single lock so both change atomically.

use std::collections::HashMap;
use std::sync::Arc;

use crate::timeline::Timeline;
use crate::{Dimension, Indexable};

/// Sizes of the index structures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Entries reachable by id
    pub entries: usize,
    /// Entries in the time-ordered sequence
    pub timeline_len: usize,
    /// Distinct keys per dimension, sorted by dimension
    pub distinct_keys: Vec<(Dimension, usize)>,
}

/// Secondary maps plus time ordering over `Arc<T>` records
#[derive(Debug)]
pub struct Index<T> {
    by_id: HashMap<String, Arc<T>>,
    keyed: HashMap<Dimension, HashMap<String, Vec<Arc<T>>>>,
    timeline: Timeline<T>,
}

impl<T> Default for Index<T> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            keyed: HashMap::new(),
            timeline: Timeline::default(),
        }
    }
}

impl<T: Indexable> Index<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to every structure
    ///
    /// Returns `false` (and changes nothing) when the id is already indexed.
    pub fn insert(&mut self, entry: Arc<T>) -> bool {
        if self.by_id.contains_key(entry.id()) {
            return false;
        }

        for (dimension, key) in entry.index_keys() {
            self.keyed
                .entry(dimension)
                .or_default()
                .entry(key.to_string())
                .or_default()
                .push(Arc::clone(&entry));
        }

        self.timeline.insert(Arc::clone(&entry));
        self.by_id.insert(entry.id().to_string(), entry);
        true
    }

    /// Remove the entry with `id` from every structure
    pub fn remove(&mut self, id: &str) -> Option<Arc<T>> {
        let entry = self.by_id.remove(id)?;

        for (dimension, key) in entry.index_keys() {
            let Some(keys) = self.keyed.get_mut(&dimension) else {
                continue;
            };
            if let Some(list) = keys.get_mut(key) {
                if let Some(pos) = list.iter().position(|e| e.id() == id) {
                    list.remove(pos);
                }
                if list.is_empty() {
                    keys.remove(key);
                }
            }
        }

        self.timeline.remove(id, entry.timestamp());
        Some(entry)
    }

    /// Discard every structure and re-derive from `entries` in order
    pub fn rebuild_all<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = &'a Arc<T>>,
        T: 'a,
    {
        self.clear();
        for entry in entries {
            self.insert(Arc::clone(entry));
        }
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.keyed.clear();
        self.timeline.clear();
    }

    /// Entries under `key` in `dimension`, in arrival order
    pub fn query_by_key(&self, dimension: Dimension, key: &str) -> &[Arc<T>] {
        self.keyed
            .get(&dimension)
            .and_then(|keys| keys.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entries with `start <= timestamp <= end`, ascending by timestamp
    pub fn query_time_range(&self, start: i64, end: i64) -> &[Arc<T>] {
        self.timeline.range(start, end)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<T>> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Every entry ascending by timestamp
    pub fn timeline(&self) -> &[Arc<T>] {
        self.timeline.as_slice()
    }

    /// Distinct keys in `dimension` with their entry counts, sorted by key
    pub fn key_counts(&self, dimension: Dimension) -> Vec<(String, usize)> {
        let mut counts: Vec<_> = self
            .keyed
            .get(&dimension)
            .map(|keys| keys.iter().map(|(k, v)| (k.clone(), v.len())).collect())
            .unwrap_or_default();
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        let mut distinct_keys: Vec<_> = self
            .keyed
            .iter()
            .map(|(dimension, keys)| (*dimension, keys.len()))
            .collect();
        distinct_keys.sort_by_key(|(dimension, _)| *dimension);

        IndexStats {
            entries: self.by_id.len(),
            timeline_len: self.timeline.len(),
            distinct_keys,
        }
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
