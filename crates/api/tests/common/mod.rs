//! Shared helpers for API integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, header},
    response::Response,
};
use chrono::Utc;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use pulse_api::{AppState, RateLimiter, build_router};
use pulse_config::{IngestConfig, RotationConfig, StreamConfig};
use pulse_pipeline::{Pipeline, RotationScheduler};
use pulse_storage::{ArchiveStore, FileBackend, Persistence};
use pulse_tap::TapPoint;

/// Router over a file-backed pipeline in a fresh temp dir
pub struct TestApp {
    pub dir: TempDir,
    pub router: Router,
    pub state: AppState,
}

pub fn test_app() -> TestApp {
    test_app_with(IngestConfig::default(), None)
}

pub fn test_app_with(ingest: IngestConfig, limiter: Option<RateLimiter>) -> TestApp {
    let dir = TempDir::new().unwrap();
    let persistence = Arc::new(Persistence::file_only(FileBackend::new(
        dir.path().join("logs.json"),
    )));
    let tap = Arc::new(TapPoint::new(&StreamConfig::default()));
    let pipeline = Arc::new(Pipeline::new(&ingest, persistence, tap));
    let scheduler = Arc::new(RotationScheduler::new(
        Arc::clone(&pipeline),
        ArchiveStore::new(dir.path().join("archives"), false),
        &RotationConfig::default(),
        Utc::now(),
    ));

    let mut state = AppState::new(pipeline, scheduler);
    if let Some(limiter) = limiter {
        state = state.with_rate_limiter(limiter);
    }

    TestApp {
        dir,
        router: build_router(state.clone()),
        state,
    }
}

/// JSON request with an optional `x-source-id`
pub fn json_request(method: Method, uri: &str, source: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(source) = source {
        builder = builder.header("x-source-id", source);
    }

    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

/// Helper to extract JSON from response
pub async fn response_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(json!({}))
}

/// Submit one structured log and return its id
pub async fn submit_log(app: &TestApp, id: &str, level: &str, source: &str) -> String {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/api/logs",
            Some(source),
            Some(json!({ "id": id, "message": format!("message {id}"), "level": level })),
        ),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    response_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Ids of the items in a query page
pub fn page_ids(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}
