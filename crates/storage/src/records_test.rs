use super::*;
use crate::testutil::{log, monitoring, source};

#[test]
fn test_log_row_round_trip() {
    let entry = log("l1", 1_700_000_000_123);
    let back = LogRow::from_entry(&entry).into_entry().unwrap();
    assert_eq!(back, *entry);
}

#[test]
fn test_log_row_without_optionals() {
    let mut entry = (*log("l1", 1_000)).clone();
    entry.script_id = None;
    entry.data = None;
    entry.quality = EntryQuality::RawText;

    let row = LogRow::from_entry(&entry);
    assert!(row.script_id.is_none());
    assert!(row.data.is_none());
    assert_eq!(row.quality, "raw-text");
    assert_eq!(row.into_entry().unwrap(), entry);
}

#[test]
fn test_unknown_quality_reads_as_normal() {
    let mut row = LogRow::from_entry(&log("l1", 1_000));
    row.quality = "mystery".into();
    assert_eq!(row.into_entry().unwrap().quality, EntryQuality::Normal);
}

#[test]
fn test_bad_time_is_corrupt_row() {
    let mut row = LogRow::from_entry(&log("l1", 1_000));
    row.time = "yesterday".into();

    let err = row.into_entry().unwrap_err();
    assert!(matches!(
        err,
        StorageError::CorruptRow { table: "logs", ref id, .. } if id == "l1"
    ));
}

#[test]
fn test_monitoring_row_round_trip() {
    let entry = monitoring("m1", 1_000);
    let row = MonitoringRow::from_entry(&entry);
    assert_eq!(row.kind, "variable");
    assert_eq!(row.into_entry().unwrap(), *entry);
}

#[test]
fn test_monitoring_unknown_kind_rejected() {
    let mut row = MonitoringRow::from_entry(&monitoring("m1", 1_000));
    row.kind = "gauge".into();
    assert!(row.into_entry().is_err());
}

#[test]
fn test_source_row_round_trip() {
    let record = source("app");
    let back = SourceRow::from_source(&record).into_source().unwrap();
    assert_eq!(back, record);
}
