use std::sync::Arc;

use crate::{Dimension, Indexable, Timeline};

#[derive(Debug)]
struct Rec {
    id: String,
    ts: i64,
}

impl Indexable for Rec {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> i64 {
        self.ts
    }

    fn index_keys(&self) -> Vec<(Dimension, &str)> {
        Vec::new()
    }
}

fn rec(id: &str, ts: i64) -> Arc<Rec> {
    Arc::new(Rec {
        id: id.to_string(),
        ts,
    })
}

fn ids(entries: &[Arc<Rec>]) -> Vec<&str> {
    entries.iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn test_out_of_order_insert_stays_sorted() {
    let mut timeline = Timeline::new();
    timeline.insert(rec("c", 300));
    timeline.insert(rec("a", 100));
    timeline.insert(rec("b", 200));

    assert_eq!(ids(timeline.as_slice()), vec!["a", "b", "c"]);
}

#[test]
fn test_equal_timestamps_keep_arrival_order() {
    let mut timeline = Timeline::new();
    timeline.insert(rec("first", 100));
    timeline.insert(rec("late", 200));
    timeline.insert(rec("second", 100));
    timeline.insert(rec("third", 100));

    assert_eq!(
        ids(timeline.as_slice()),
        vec!["first", "second", "third", "late"]
    );
}

#[test]
fn test_insert_returns_position() {
    let mut timeline = Timeline::new();
    assert_eq!(timeline.insert(rec("a", 10)), 0);
    assert_eq!(timeline.insert(rec("b", 30)), 1);
    assert_eq!(timeline.insert(rec("c", 20)), 1);
}

#[test]
fn test_range_is_inclusive() {
    let mut timeline = Timeline::new();
    for (id, ts) in [("a", 100), ("b", 200), ("c", 200), ("d", 300), ("e", 400)] {
        timeline.insert(rec(id, ts));
    }

    assert_eq!(ids(timeline.range(200, 300)), vec!["b", "c", "d"]);
    assert_eq!(ids(timeline.range(0, 100)), vec!["a"]);
    assert_eq!(ids(timeline.range(400, 1000)), vec!["e"]);
    assert!(timeline.range(401, 1000).is_empty());
}

#[test]
fn test_inverted_range_is_empty() {
    let mut timeline = Timeline::new();
    timeline.insert(rec("a", 100));

    assert!(timeline.range(200, 100).is_empty());
}

#[test]
fn test_remove_within_equal_run() {
    let mut timeline = Timeline::new();
    for id in ["a", "b", "c"] {
        timeline.insert(rec(id, 100));
    }

    let removed = timeline.remove("b", 100).unwrap();
    assert_eq!(removed.id, "b");
    assert_eq!(ids(timeline.as_slice()), vec!["a", "c"]);
}

#[test]
fn test_remove_with_wrong_timestamp_misses() {
    let mut timeline = Timeline::new();
    timeline.insert(rec("a", 100));

    assert!(timeline.remove("a", 101).is_none());
    assert_eq!(timeline.len(), 1);
}
