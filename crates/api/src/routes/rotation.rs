//! Rotation and archive endpoints
//!
//! | Endpoint | Notes |
//! |----------|-------|
//! | `POST /api/rotation/trigger` | Manual rotation; 409 while one is running |
//! | `GET /api/rotation/status` | Scheduler state, last rotation, next due |
//! | `GET /api/archives` | Archive files, oldest first |
//! | `GET /api/archives/{name}` | One archive, decoded |

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;

use pulse_pipeline::{RotationReport, RotationStatus, RotationTrigger};
use pulse_protocol::ArchiveDocument;
use pulse_storage::ArchiveInfo;

use crate::error::Result;
use crate::state::AppState;

/// Archive listing
#[derive(Debug, Serialize)]
pub struct ArchivesResponse {
    pub count: usize,
    pub archives: Vec<ArchiveInfo>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/rotation/trigger", post(trigger))
        .route("/api/rotation/status", get(status))
        .route("/api/archives", get(list_archives))
        .route("/api/archives/{name}", get(get_archive))
}

/// POST /api/rotation/trigger
async fn trigger(State(state): State<AppState>) -> Result<Json<RotationReport>> {
    let report = state.scheduler.rotate(RotationTrigger::Manual).await?;
    Ok(Json(report))
}

/// GET /api/rotation/status
async fn status(State(state): State<AppState>) -> Json<RotationStatus> {
    Json(state.scheduler.status().await)
}

/// GET /api/archives
async fn list_archives(State(state): State<AppState>) -> Result<Json<ArchivesResponse>> {
    let archives = state.scheduler.archives().list().await?;
    Ok(Json(ArchivesResponse {
        count: archives.len(),
        archives,
    }))
}

/// GET /api/archives/{name}
async fn get_archive(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ArchiveDocument>> {
    Ok(Json(state.scheduler.archives().read(&name).await?))
}
