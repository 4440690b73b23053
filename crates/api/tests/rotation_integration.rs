//! Integration tests for rotation, archives and ops endpoints

mod common;

use axum::http::{Method, StatusCode};

use common::*;

fn trigger() -> axum::http::Request<axum::body::Body> {
    json_request(Method::POST, "/api/rotation/trigger", None, None)
}

#[tokio::test]
async fn test_manual_rotation_round_trip() {
    let app = test_app();
    submit_log(&app, "A", "info", "web").await;
    submit_log(&app, "B", "error", "web").await;

    let response = send(&app, trigger()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = response_json(response).await;
    assert_eq!(report["trigger"], "manual");
    assert_eq!(report["logsArchived"], 2);
    let name = report["archive"]["name"].as_str().unwrap().to_string();

    // live set is empty afterwards
    let page = response_json(send(&app, get("/api/logs")).await).await;
    assert_eq!(page["total"], 0);

    let list = response_json(send(&app, get("/api/archives")).await).await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["archives"][0]["name"], name.as_str());

    let archive = response_json(send(&app, get(&format!("/api/archives/{name}"))).await).await;
    let mut ids: Vec<&str> = archive["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    ids.sort();
    assert_eq!(ids, ["A", "B"]);
    assert_eq!(archive["metadata"]["originalLogCount"], 2);
    assert_eq!(archive["metadata"]["rotationInterval"], "daily");
}

#[tokio::test]
async fn test_unknown_archive() {
    let app = test_app();

    let response = send(&app, get("/api/archives/archive_2020-01-01.json")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/api/archives/..%2Flogs.json")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rotation_status() {
    let app = test_app();

    let status = response_json(send(&app, get("/api/rotation/status")).await).await;
    assert_eq!(status["enabled"], true);
    assert_eq!(status["state"], "idle");
    assert_eq!(status["interval"], "daily");
    assert_eq!(status["archiveCount"], 0);

    submit_log(&app, "A", "info", "web").await;
    send(&app, trigger()).await;

    let status = response_json(send(&app, get("/api/rotation/status")).await).await;
    assert_eq!(status["archiveCount"], 1);
    assert!(status["lastArchive"].is_string());
}

#[tokio::test]
async fn test_health_and_stats() {
    let app = test_app();
    submit_log(&app, "A", "info", "web").await;

    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let health = response_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["backend"], "file");
    assert_eq!(health["logs"], 1);
    assert_eq!(health["rotationState"], "idle");

    let stats = response_json(send(&app, get("/api/stats")).await).await;
    assert_eq!(stats["pipeline"]["logs"], 1);
    assert_eq!(stats["pipeline"]["sources"], 1);
    assert_eq!(stats["pipeline"]["logIndex"]["entries"], 1);
    assert_eq!(stats["pipeline"]["ingest"]["logsAccepted"], 1);
    assert_eq!(stats["persistence"]["backend"], "file");
    assert_eq!(stats["stream"]["published"], 1);
    assert!(stats.get("rateLimit").is_none());
}
