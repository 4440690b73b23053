//! Filtered, paginated queries over the live sets
//!
//! Each query starts from the narrowest structure the index offers (a time
//! range slice or the shortest matching key list), filters the remaining
//! conditions linearly, then sorts newest-first and paginates.

use std::sync::Arc;

use chrono::DateTime;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use pulse_index::{Dimension, Index, Indexable};
use pulse_protocol::{LogEntry, MonitoringEntry};

/// Log query parameters
///
/// `level` accepts a comma-separated list. `start`/`end` accept RFC 3339 or
/// Unix milliseconds and are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogQuery {
    pub source_id: Option<String>,
    pub level: Option<String>,
    pub script_id: Option<String>,
    #[serde(deserialize_with = "time_bound")]
    pub start: Option<i64>,
    #[serde(deserialize_with = "time_bound")]
    pub end: Option<i64>,
    pub search: Option<String>,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Monitoring query parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitoringQuery {
    pub source_id: Option<String>,
    pub module_id: Option<String>,
    pub script_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    #[serde(deserialize_with = "time_bound")]
    pub start: Option<i64>,
    #[serde(deserialize_with = "time_bound")]
    pub end: Option<i64>,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// One page of results, newest first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<Arc<T>>,
    /// Matches before pagination
    pub total: usize,
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl LogQuery {
    fn levels(&self) -> Vec<String> {
        self.level
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|l| l.trim().to_lowercase())
                    .filter(|l| !l.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn run(&self, index: &Index<LogEntry>) -> Page<LogEntry> {
        let levels = self.levels();
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut keys = Vec::new();
        push_key(&mut keys, Dimension::Source, self.source_id.as_deref());
        push_key(&mut keys, Dimension::Script, self.script_id.as_deref());
        if let [level] = levels.as_slice() {
            keys.push((Dimension::Level, level.as_str()));
        }

        let candidates = candidates(index, &keys, self.start, self.end);
        let matches = candidates
            .iter()
            .filter(|e| self.source_id.as_deref().is_none_or(|s| e.source_id == s))
            .filter(|e| {
                self.script_id
                    .as_deref()
                    .is_none_or(|s| e.script_id.as_deref() == Some(s))
            })
            .filter(|e| levels.is_empty() || levels.contains(&e.level))
            .filter(|e| in_range(e.timestamp, self.start, self.end))
            .filter(|e| needle.as_deref().is_none_or(|n| e.contains_text(n)))
            .cloned()
            .collect();

        paginate(matches, self.offset, self.limit)
    }
}

impl MonitoringQuery {
    pub fn run(&self, index: &Index<MonitoringEntry>) -> Page<MonitoringEntry> {
        let kind = self.kind.as_deref().map(str::to_lowercase);

        let mut keys = Vec::new();
        push_key(&mut keys, Dimension::Source, self.source_id.as_deref());
        push_key(&mut keys, Dimension::Module, self.module_id.as_deref());
        push_key(&mut keys, Dimension::Script, self.script_id.as_deref());
        push_key(&mut keys, Dimension::Kind, kind.as_deref());
        push_key(&mut keys, Dimension::Name, self.name.as_deref());

        let candidates = candidates(index, &keys, self.start, self.end);
        let matches = candidates
            .iter()
            .filter(|e| self.source_id.as_deref().is_none_or(|s| e.source_id == s))
            .filter(|e| self.module_id.as_deref().is_none_or(|s| e.module_id == s))
            .filter(|e| self.script_id.as_deref().is_none_or(|s| e.script_id == s))
            .filter(|e| kind.as_deref().is_none_or(|k| e.kind.as_str() == k))
            .filter(|e| self.name.as_deref().is_none_or(|n| e.name == n))
            .filter(|e| in_range(e.timestamp, self.start, self.end))
            .cloned()
            .collect();

        paginate(matches, self.offset, self.limit)
    }
}

fn push_key<'a>(keys: &mut Vec<(Dimension, &'a str)>, dimension: Dimension, key: Option<&'a str>) {
    if let Some(key) = key {
        keys.push((dimension, key));
    }
}

/// Narrowest starting slice: the time range when bounded, otherwise the
/// shortest key list, otherwise everything
fn candidates<'a, T: Indexable>(
    index: &'a Index<T>,
    keys: &[(Dimension, &str)],
    start: Option<i64>,
    end: Option<i64>,
) -> &'a [Arc<T>] {
    let mut best = if start.is_some() || end.is_some() {
        index.query_time_range(start.unwrap_or(i64::MIN), end.unwrap_or(i64::MAX))
    } else {
        index.timeline()
    };

    for (dimension, key) in keys {
        let list = index.query_by_key(*dimension, key);
        if list.len() < best.len() {
            best = list;
        }
    }
    best
}

fn in_range(ts: i64, start: Option<i64>, end: Option<i64>) -> bool {
    start.is_none_or(|s| ts >= s) && end.is_none_or(|e| ts <= e)
}

fn paginate<T: Indexable>(mut matches: Vec<Arc<T>>, offset: usize, limit: Option<usize>) -> Page<T> {
    matches.sort_by_key(|e| std::cmp::Reverse(e.timestamp()));
    let total = matches.len();
    let items = matches
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    Page {
        items,
        total,
        offset,
        limit,
    }
}

/// Parse an RFC 3339 time or Unix milliseconds
pub fn parse_time_bound(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.timestamp_millis())
    })
}

fn time_bound<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_time_bound(&raw)
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("invalid time '{raw}'")))
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
