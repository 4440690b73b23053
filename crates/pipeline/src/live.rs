//! Bounded live set
//!
//! `LiveSet<T>` owns the not-yet-archived entries in arrival order together
//! with their [`Index`]. Every method leaves both in agreement before it
//! returns; callers hold the set behind a lock and never await while
//! holding it.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use pulse_index::{Index, Indexable};

/// Result of inserting one entry
#[derive(Debug)]
pub enum Admission<T> {
    /// Entry is live; `evicted` holds entries pushed out by the cap
    Inserted { evicted: Vec<Arc<T>> },
    /// An entry with the same id is already live; nothing changed
    Duplicate,
}

/// Result of a bulk append
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Ids appended, in order
    pub inserted: Vec<String>,
    /// Ids skipped because they were already live or repeated in the batch
    pub duplicates: Vec<String>,
    /// Entries dropped to get back under the cap
    pub evicted: usize,
}

/// Entries in arrival order plus their index, capped at `cap`
#[derive(Debug)]
pub struct LiveSet<T> {
    entries: VecDeque<Arc<T>>,
    index: Index<T>,
    cap: usize,
}

impl<T: Indexable> LiveSet<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            index: Index::new(),
            cap: cap.max(1),
        }
    }

    /// Append one entry and index it, evicting the oldest past the cap
    pub fn insert(&mut self, entry: Arc<T>) -> Admission<T> {
        if !self.index.insert(Arc::clone(&entry)) {
            return Admission::Duplicate;
        }
        self.entries.push_back(entry);

        let mut evicted = Vec::new();
        while self.entries.len() > self.cap {
            if let Some(oldest) = self.entries.pop_front() {
                self.index.remove(oldest.id());
                evicted.push(oldest);
            }
        }
        Admission::Inserted { evicted }
    }

    /// Append many entries, then cap and rebuild the index once
    pub fn extend(&mut self, entries: impl IntoIterator<Item = Arc<T>>) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();

        for entry in entries {
            let id = entry.id().to_string();
            if self.index.contains(&id) || !seen.insert(id.clone()) {
                outcome.duplicates.push(id);
                continue;
            }
            self.entries.push_back(entry);
            outcome.inserted.push(id);
        }

        outcome.evicted = self.enforce_cap();
        self.rebuild();
        outcome
    }

    /// Replace the whole set, keeping the newest `cap` arrivals
    ///
    /// Returns how many entries were dropped (over the cap or duplicate).
    pub fn replace_all(&mut self, entries: Vec<Arc<T>>) -> usize {
        let total = entries.len();
        self.entries.clear();
        self.index.clear();
        let outcome = self.extend(entries);
        total - outcome.inserted.len() + outcome.evicted
    }

    /// Keep entries for which `keep` is true; returns how many were removed
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| keep(e));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.rebuild();
        }
        removed
    }

    /// Remove exactly the given ids
    pub fn remove_ids(&mut self, ids: &HashSet<String>) -> usize {
        if ids.is_empty() {
            return 0;
        }
        self.retain(|e| !ids.contains(e.id()))
    }

    /// Drop every entry
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.index.clear();
        removed
    }

    /// Entries in arrival order
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<T>> {
        self.index.get(id)
    }

    pub fn index(&self) -> &Index<T> {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    fn enforce_cap(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.cap);
        self.entries.drain(..excess);
        excess
    }

    fn rebuild(&mut self) {
        self.index.rebuild_all(self.entries.iter());
    }
}

#[cfg(test)]
#[path = "live_test.rs"]
mod tests;
