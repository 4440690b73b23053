//! Monitoring endpoints
//!
//! | Endpoint | Notes |
//! |----------|-------|
//! | `POST /api/monitoring` | Object or array (fail-fast batch); rate limited |
//! | `GET /api/monitoring` | Filtered, paginated, newest first |
//! | `DELETE /api/monitoring` | All entries, or one module with `?moduleId=` |
//! | `GET /api/monitoring/structure` | Latest entry per module/script/kind/name |

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;

use pulse_pipeline::{MonitoringQuery, MonitoringStructure, Page};
use pulse_protocol::MonitoringEntry;

use crate::error::Result;
use crate::ratelimit::RateLimitLayer;
use crate::routes::logs::{BatchResponse, DeleteResponse};
use crate::routes::{payload, query, source_header};
use crate::state::AppState;

/// Bulk delete filter
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMonitoringQuery {
    pub module_id: Option<String>,
}

/// Structure view filter
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureQuery {
    pub source_id: Option<String>,
}

pub fn routes(limit: RateLimitLayer) -> Router<AppState> {
    Router::new()
        .route("/api/monitoring", post(ingest_monitoring).layer(limit))
        .route(
            "/api/monitoring",
            get(query_monitoring).delete(delete_monitoring),
        )
        .route("/api/monitoring/structure", get(structure))
}

/// POST /api/monitoring
async fn ingest_monitoring(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let source = source_header(&headers);

    match payload(&headers, &body)? {
        Value::Array(items) => {
            let accepted = state.pipeline.submit_monitoring_batch(items, source).await?;
            let response = BatchResponse {
                count: accepted.len(),
                accepted,
            };
            Ok((StatusCode::CREATED, Json(response)).into_response())
        }
        raw => {
            let accepted = state.pipeline.submit_monitoring(raw, source).await?;
            Ok((StatusCode::CREATED, Json(accepted)).into_response())
        }
    }
}

/// GET /api/monitoring
async fn query_monitoring(
    State(state): State<AppState>,
    params: std::result::Result<Query<MonitoringQuery>, QueryRejection>,
) -> Result<Json<Page<MonitoringEntry>>> {
    let params = query(params)?;
    Ok(Json(state.pipeline.query_monitoring(&params)))
}

/// DELETE /api/monitoring
async fn delete_monitoring(
    State(state): State<AppState>,
    params: std::result::Result<Query<DeleteMonitoringQuery>, QueryRejection>,
) -> Result<Json<DeleteResponse>> {
    let params = query(params)?;
    let deleted = state
        .pipeline
        .delete_monitoring(params.module_id.as_deref())
        .await;
    Ok(Json(DeleteResponse { deleted }))
}

/// GET /api/monitoring/structure
async fn structure(
    State(state): State<AppState>,
    params: std::result::Result<Query<StructureQuery>, QueryRejection>,
) -> Result<Json<MonitoringStructure>> {
    let params = query(params)?;
    Ok(Json(
        state.pipeline.monitoring_structure(params.source_id.as_deref()),
    ))
}
