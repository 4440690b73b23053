//! Subscription filter
//!
//! # Filter Logic
//!
//! - All filters are optional (None = match all)
//! - Multiple values in a filter are OR'd (match any)
//! - Different filters are AND'd (must match all specified filters)
//! - `levels` only constrains log entries; monitoring entries have no level
//!
//! # Example
//!
//! ```
//! use pulse_tap::{ItemKind, TapFilter};
//!
//! // Error logs from the checkout service
//! let filter = TapFilter::new()
//!     .with_kinds([ItemKind::Log])
//!     .with_sources(["checkout"])
//!     .with_levels(["error"]);
//! ```

use std::collections::HashSet;

use crate::item::{ItemKind, TapItem};
use crate::protocol::SubscribeFilters;

/// Metadata filter for item matching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapFilter {
    /// Item kinds to match (None = match all)
    kinds: Option<HashSet<ItemKind>>,
    /// Source IDs to match (None = match all)
    sources: Option<HashSet<String>>,
    /// Log levels to match, lowercase (None = match all)
    levels: Option<HashSet<String>>,
    /// Script ID to match (None = match all)
    script_id: Option<String>,
}

impl TapFilter {
    /// Create an empty filter (matches everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a push-stream subscribe frame
    ///
    /// Empty lists are treated as absent.
    pub fn from_subscribe(filters: &SubscribeFilters) -> Self {
        let mut filter = Self::new();
        if let Some(sources) = filters.sources.as_ref().filter(|s| !s.is_empty()) {
            filter = filter.with_sources(sources.iter().map(String::as_str));
        }
        if let Some(levels) = filters.levels.as_ref().filter(|l| !l.is_empty()) {
            filter = filter.with_levels(levels.iter().map(String::as_str));
        }
        filter
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ItemKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn with_sources<S: AsRef<str>>(mut self, sources: impl IntoIterator<Item = S>) -> Self {
        self.sources = Some(sources.into_iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    pub fn with_levels<S: AsRef<str>>(mut self, levels: impl IntoIterator<Item = S>) -> Self {
        self.levels = Some(
            levels
                .into_iter()
                .map(|l| l.as_ref().to_lowercase())
                .collect(),
        );
        self
    }

    pub fn with_script(mut self, script_id: impl Into<String>) -> Self {
        self.script_id = Some(script_id.into());
        self
    }

    /// Check if filter is empty (matches everything)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_none()
            && self.sources.is_none()
            && self.levels.is_none()
            && self.script_id.is_none()
    }

    /// Check if this filter admits `kind` at all
    #[inline]
    pub fn accepts_kind(&self, kind: ItemKind) -> bool {
        self.kinds.as_ref().is_none_or(|k| k.contains(&kind))
    }

    /// Check if an item matches this filter
    #[inline]
    pub fn matches(&self, item: &TapItem) -> bool {
        if self.is_empty() {
            return true;
        }

        if !self.accepts_kind(item.kind()) {
            return false;
        }

        if let Some(ref sources) = self.sources
            && !sources.contains(item.source_id())
        {
            return false;
        }

        if let Some(ref levels) = self.levels
            && let Some(level) = item.level()
            && !levels.contains(level)
        {
            return false;
        }

        if let Some(ref script_id) = self.script_id
            && item.script_id() != Some(script_id.as_str())
        {
            return false;
        }

        true
    }

    /// Get source filter (for logging)
    pub fn sources(&self) -> Option<&HashSet<String>> {
        self.sources.as_ref()
    }

    /// Get level filter (for logging)
    pub fn levels(&self) -> Option<&HashSet<String>> {
        self.levels.as_ref()
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
