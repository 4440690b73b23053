//! Log endpoints
//!
//! | Endpoint | Notes |
//! |----------|-------|
//! | `POST /api/logs` | Object, raw text, or array (fail-fast batch); rate limited |
//! | `GET /api/logs` | Filtered, paginated, newest first |
//! | `DELETE /api/logs` | All logs, or one source with `?sourceId=` |
//! | `GET /api/logs/{id}` | One live entry |
//! | `POST /api/import` | Best-effort bulk import; rate limited |

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pulse_pipeline::{Accepted, ImportReport, ImportRequest, LogQuery, Page};
use pulse_protocol::LogEntry;

use crate::error::Result;
use crate::ratelimit::RateLimitLayer;
use crate::routes::{json_body, payload, query, source_header};
use crate::state::AppState;

// =============================================================================
// Request/Response types
// =============================================================================

/// Acknowledgement for a batch submission
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub count: usize,
    pub accepted: Vec<Accepted>,
}

/// Bulk delete filter
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLogsQuery {
    pub source_id: Option<String>,
}

/// Bulk delete result
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: usize,
}

pub fn routes(limit: RateLimitLayer) -> Router<AppState> {
    Router::new()
        .route("/api/logs", post(ingest_logs).layer(limit.clone()))
        .route("/api/logs", get(query_logs).delete(delete_logs))
        .route("/api/logs/{id}", get(get_log))
        .route("/api/import", post(import).layer(limit))
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/logs
async fn ingest_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let source = source_header(&headers);

    match payload(&headers, &body)? {
        Value::Array(items) => {
            let accepted = state.pipeline.submit_log_batch(items, source).await?;
            let response = BatchResponse {
                count: accepted.len(),
                accepted,
            };
            Ok((StatusCode::CREATED, Json(response)).into_response())
        }
        raw => {
            let accepted = state.pipeline.submit_log(raw, source).await?;
            Ok((StatusCode::CREATED, Json(accepted)).into_response())
        }
    }
}

/// GET /api/logs
async fn query_logs(
    State(state): State<AppState>,
    params: std::result::Result<Query<LogQuery>, QueryRejection>,
) -> Result<Json<Page<LogEntry>>> {
    let params = query(params)?;
    Ok(Json(state.pipeline.query_logs(&params)))
}

/// GET /api/logs/{id}
async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Arc<LogEntry>>> {
    Ok(Json(state.pipeline.log(&id)?))
}

/// DELETE /api/logs
async fn delete_logs(
    State(state): State<AppState>,
    params: std::result::Result<Query<DeleteLogsQuery>, QueryRejection>,
) -> Result<Json<DeleteResponse>> {
    let params = query(params)?;
    let deleted = state.pipeline.delete_logs(params.source_id.as_deref()).await;
    Ok(Json(DeleteResponse { deleted }))
}

/// POST /api/import
async fn import(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImportReport>> {
    let request: ImportRequest = json_body(&body)?;
    let report = state.pipeline.import(request, source_header(&headers)).await;
    Ok(Json(report))
}
