//! Tests for the replay buffer

use super::*;
use crate::testutil::{ids, log_item};

#[test]
fn test_empty_buffer() {
    let buffer = ReplayBuffer::with_capacity(4);
    assert!(buffer.is_empty());
    assert!(buffer.last_n(10).is_empty());
}

#[test]
fn test_last_n_oldest_first() {
    let buffer = ReplayBuffer::with_capacity(10);
    for id in ["a", "b", "c", "d"] {
        buffer.push(log_item(id, "app", "info"));
    }

    assert_eq!(ids(&buffer.last_n(2)), vec!["c", "d"]);
    assert_eq!(ids(&buffer.last_n(10)), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_wraparound_keeps_newest() {
    let buffer = ReplayBuffer::with_capacity(3);
    for id in ["a", "b", "c", "d", "e"] {
        buffer.push(log_item(id, "app", "info"));
    }

    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.total_written(), 5);
    assert_eq!(ids(&buffer.last_n(3)), vec!["c", "d", "e"]);
}

#[test]
fn test_filter_applies_before_count() {
    let buffer = ReplayBuffer::with_capacity(10);
    buffer.push(log_item("e1", "app", "error"));
    buffer.push(log_item("i1", "app", "info"));
    buffer.push(log_item("e2", "app", "error"));
    buffer.push(log_item("i2", "app", "info"));
    buffer.push(log_item("i3", "app", "info"));

    let filter = TapFilter::new().with_levels(["error"]);
    assert_eq!(ids(&buffer.last_n_matching(2, &filter)), vec!["e1", "e2"]);
    assert_eq!(ids(&buffer.last_n_matching(1, &filter)), vec!["e2"]);
}

#[test]
fn test_clear() {
    let buffer = ReplayBuffer::with_capacity(3);
    buffer.push(log_item("a", "app", "info"));
    buffer.clear();

    assert!(buffer.is_empty());
    assert_eq!(buffer.total_written(), 0);

    buffer.push(log_item("b", "app", "info"));
    assert_eq!(ids(&buffer.last_n(5)), vec!["b"]);
}

#[test]
fn test_retain_drops_only_rejected_items() {
    let buffer = ReplayBuffer::with_capacity(4);
    for id in ["a", "b", "c", "d", "e", "f"] {
        buffer.push(log_item(id, "app", "info"));
    }

    // Wrapped ring holds c..f
    assert_eq!(buffer.retain(|item| !matches!(item.id(), "c" | "e")), 2);
    assert_eq!(ids(&buffer.last_n(10)), vec!["d", "f"]);

    buffer.push(log_item("g", "app", "info"));
    buffer.push(log_item("h", "app", "info"));
    buffer.push(log_item("i", "app", "info"));
    assert_eq!(ids(&buffer.last_n(10)), vec!["f", "g", "h", "i"]);
}

#[test]
fn test_zero_capacity_is_clamped() {
    let buffer = ReplayBuffer::with_capacity(0);
    assert_eq!(buffer.capacity(), 1);
    buffer.push(log_item("a", "app", "info"));
    buffer.push(log_item("b", "app", "info"));
    assert_eq!(ids(&buffer.last_n(5)), vec!["b"]);
}
