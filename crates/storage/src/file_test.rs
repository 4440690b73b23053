use tempfile::TempDir;

use super::*;
use crate::testutil::{ids, log, monitoring, snapshot, source};

fn backend(dir: &TempDir) -> FileBackend {
    FileBackend::new(dir.path().join("nested").join("logs.json"))
}

#[tokio::test]
async fn test_missing_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let backend = backend(&dir);
    backend.initialize().await.unwrap();

    let loaded = backend.load_all().await.unwrap();
    assert!(loaded.is_empty());
}

#[tokio::test]
async fn test_save_all_then_load_all() {
    let dir = TempDir::new().unwrap();
    let backend = backend(&dir);
    backend.initialize().await.unwrap();

    let state = snapshot();
    backend.save_all(&state).await.unwrap();

    let loaded = backend.load_all().await.unwrap();
    assert_eq!(ids(loaded.logs.iter().map(|e| &e.id)), vec!["l1", "l2"]);
    assert_eq!(loaded.monitoring.len(), 1);
    assert_eq!(loaded.sources, state.sources);
    assert_eq!(*loaded.logs[0], *state.logs[0]);
}

#[tokio::test]
async fn test_collection_save_merges_with_document() {
    let dir = TempDir::new().unwrap();
    let backend = backend(&dir);
    backend.initialize().await.unwrap();
    backend.save_all(&snapshot()).await.unwrap();

    backend.save_logs(&[log("l9", 9_000)]).await.unwrap();

    let loaded = backend.load_all().await.unwrap();
    assert_eq!(ids(loaded.logs.iter().map(|e| &e.id)), vec!["l9"]);
    // Other collections survive the rewrite
    assert_eq!(loaded.monitoring.len(), 1);
    assert_eq!(loaded.sources.len(), 1);
}

#[tokio::test]
async fn test_document_layout() {
    let dir = TempDir::new().unwrap();
    let backend = backend(&dir);
    backend.initialize().await.unwrap();
    backend.save_monitoring(&[monitoring("m1", 1)]).await.unwrap();
    backend.save_sources(&[source("app")]).await.unwrap();

    let raw = std::fs::read_to_string(backend.path()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert!(doc["logs"].as_array().unwrap().is_empty());
    assert_eq!(doc["monitoringData"][0]["type"], "variable");
    assert_eq!(doc["sources"][0][0], "app");
    assert_eq!(doc["sources"][0][1]["sourceId"], "app");
    assert!(doc["timestamp"].is_string());
}

#[tokio::test]
async fn test_corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let backend = backend(&dir);
    backend.initialize().await.unwrap();
    std::fs::write(backend.path(), b"{not json").unwrap();

    assert!(matches!(
        backend.load_logs().await,
        Err(StorageError::Serialization(_))
    ));
}

#[tokio::test]
async fn test_incremental_not_handled() {
    let dir = TempDir::new().unwrap();
    let backend = backend(&dir);

    let outcome = backend.add_log(&log("l1", 1)).await.unwrap();
    assert_eq!(outcome, crate::WriteOutcome::NotHandled);
}
