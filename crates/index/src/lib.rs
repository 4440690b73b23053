//! Pulse Index - Derived lookup structures over the live entry set
//!
//! The index is never the source of truth: it can always be rebuilt from the
//! live set with [`Index::rebuild_all`]. It keeps three kinds of structure in
//! lockstep:
//!
//! - an `id → entry` map
//! - one-to-many secondary maps keyed by [`Dimension`] (source, level,
//!   script, module, type, name), each list in arrival order
//! - a single [`Timeline`] sorted by `timestamp`, ties in arrival order
//!
//! # Architecture
//!
//! ```text
//!            insert(Arc<T>)
//!                 │
//!      ┌──────────┼───────────────┐
//!      ▼          ▼               ▼
//!   by_id    keyed[dim][key]   Timeline (binary-search insert)
//!      │          │               │
//!   get(id)  query_by_key     query_time_range(start, end)
//! ```
//!
//! Entries are shared as `Arc<T>`, so every structure holds a pointer to the
//! same record the live set owns.

mod dimension;
mod engine;
mod entries;
mod timeline;

#[cfg(test)]
mod timeline_test;

pub use dimension::Dimension;
pub use engine::{Index, IndexStats};
pub use timeline::Timeline;

/// A record that can be placed in an [`Index`]
pub trait Indexable: Send + Sync {
    /// Unique identity within the live set
    fn id(&self) -> &str;

    /// Ordering key in Unix milliseconds
    fn timestamp(&self) -> i64;

    /// Secondary keys this record is reachable under
    fn index_keys(&self) -> Vec<(Dimension, &str)>;
}
