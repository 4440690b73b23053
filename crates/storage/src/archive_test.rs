use chrono::TimeZone;
use tempfile::TempDir;

use super::*;
use crate::testutil::{log, monitoring, source};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, d, 10, 30, 0).unwrap()
}

fn document(at: DateTime<Utc>) -> ArchiveDocument {
    ArchiveDocument::new(
        "daily",
        at,
        vec![log("a", 1), log("b", 2)],
        vec![monitoring("m1", 1)],
        vec![source("app")],
    )
}

#[test]
fn test_base_names_per_interval() {
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 7, 0, 0).unwrap();

    assert_eq!(
        archive_base_name(RotationInterval::Hourly, at, false),
        "archive_2025-01-02_07.json"
    );
    assert_eq!(
        archive_base_name(RotationInterval::Daily, at, false),
        "archive_2025-01-02.json"
    );
    assert_eq!(
        archive_base_name(RotationInterval::Weekly, at, false),
        "archive_2025-W01.json"
    );
    assert_eq!(
        archive_base_name(RotationInterval::Monthly, at, true),
        "archive_2025-01.json.lz4"
    );
}

#[test]
fn test_suffix_keeps_extension() {
    assert_eq!(with_suffix("archive_2025-01.json", 2), "archive_2025-01_2.json");
    assert_eq!(
        with_suffix("archive_2025-01.json.lz4", 1),
        "archive_2025-01_1.json.lz4"
    );
}

#[test]
fn test_name_validation() {
    assert!(validate_name("archive_2025-01-02.json").is_ok());
    assert!(validate_name("archive_2025-01-02_1.json.lz4").is_ok());

    for bad in [
        "../etc/passwd",
        "archive_../../x.json",
        "archive_a/b.json",
        "archive_a\\b.json",
        "logs.json",
        "archive_2025.txt",
    ] {
        assert!(
            matches!(validate_name(bad), Err(StorageError::InvalidArchiveName(_))),
            "{bad} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_write_then_read_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = ArchiveStore::new(dir.path().join("archives"), false);
    let original = document(day(1));

    let info = store
        .write(&original, RotationInterval::Daily, day(1))
        .await
        .unwrap();
    assert_eq!(info.name, "archive_2025-03-01.json");
    assert!(!info.compressed);

    let back = store.read(&info.name).await.unwrap();
    assert_eq!(back.metadata, original.metadata);
    assert_eq!(back.metadata.original_log_count, 2);
    assert_eq!(back.logs.len(), 2);
    assert_eq!(*back.logs[1], *original.logs[1]);
    assert_eq!(*back.monitoring_data[0], *original.monitoring_data[0]);
    assert_eq!(back.sources, original.sources);
}

#[tokio::test]
async fn test_compressed_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = ArchiveStore::new(dir.path(), true);
    let original = document(day(2));

    let info = store
        .write(&original, RotationInterval::Daily, day(2))
        .await
        .unwrap();
    assert!(info.name.ends_with(".json.lz4"));

    let raw = std::fs::read(dir.path().join(&info.name)).unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&raw).is_err());

    let back = store.read(&info.name).await.unwrap();
    assert_eq!(back.logs.len(), 2);
    assert_eq!(back.metadata.rotation_interval, "daily");
}

#[tokio::test]
async fn test_existing_archive_never_overwritten() {
    let dir = TempDir::new().unwrap();
    let store = ArchiveStore::new(dir.path(), false);

    let first = store
        .write(&document(day(3)), RotationInterval::Daily, day(3))
        .await
        .unwrap();
    let second = store
        .write(&document(day(3)), RotationInterval::Daily, day(3))
        .await
        .unwrap();
    let third = store
        .write(&document(day(3)), RotationInterval::Daily, day(3))
        .await
        .unwrap();

    assert_eq!(first.name, "archive_2025-03-03.json");
    assert_eq!(second.name, "archive_2025-03-03_1.json");
    assert_eq!(third.name, "archive_2025-03-03_2.json");
    assert_eq!(store.list().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_list_skips_foreign_files() {
    let dir = TempDir::new().unwrap();
    let store = ArchiveStore::new(dir.path(), false);
    std::fs::write(dir.path().join("notes.txt"), b"hi").unwrap();
    std::fs::create_dir(dir.path().join("archive_dir.json")).unwrap();

    store
        .write(&document(day(4)), RotationInterval::Daily, day(4))
        .await
        .unwrap();

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "archive_2025-03-04.json");
    assert!(listed[0].size > 0);
}

#[tokio::test]
async fn test_list_missing_dir_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = ArchiveStore::new(dir.path().join("absent"), false);

    assert!(store.list().await.unwrap().is_empty());
    assert!(store.latest_created().await.unwrap().is_none());
}

#[tokio::test]
async fn test_read_unknown_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = ArchiveStore::new(dir.path(), false);

    let err = store.read("archive_1999-01-01.json").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_prune_keeps_newest() {
    let dir = TempDir::new().unwrap();
    let store = ArchiveStore::new(dir.path(), false);

    for d in 1..=5 {
        store
            .write(&document(day(d)), RotationInterval::Daily, day(d))
            .await
            .unwrap();
    }

    let report = store.prune(2).await.unwrap();
    assert_eq!(
        report.deleted,
        vec![
            "archive_2025-03-01.json",
            "archive_2025-03-02.json",
            "archive_2025-03-03.json"
        ]
    );
    assert!(report.failed.is_empty());

    let names: Vec<_> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, vec!["archive_2025-03-04.json", "archive_2025-03-05.json"]);
}

#[tokio::test]
async fn test_prune_under_limit_is_noop() {
    let dir = TempDir::new().unwrap();
    let store = ArchiveStore::new(dir.path(), false);
    store
        .write(&document(day(1)), RotationInterval::Daily, day(1))
        .await
        .unwrap();

    let report = store.prune(5).await.unwrap();
    assert_eq!(report, PruneReport::default());
    assert!(store.latest_created().await.unwrap().is_some());
}
