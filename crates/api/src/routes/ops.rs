//! Operations routes
//!
//! Health and stats endpoints for monitoring the server itself. Both are
//! read-only views: nothing here mutates pipeline state.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use pulse_pipeline::{PipelineStats, RotationState, RotationStatus};
use pulse_storage::PersistenceStats;
use pulse_tap::TapStats;

use crate::ratelimit::RateLimitSnapshot;
use crate::state::AppState;

// =============================================================================
// Response Types
// =============================================================================

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    /// Backend serving normal persistence operations
    pub backend: &'static str,
    pub logs: usize,
    pub monitoring: usize,
    pub rotation_state: RotationState,
    pub last_rotation: DateTime<Utc>,
}

/// Persistence section of the stats view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceView {
    pub backend: &'static str,
    #[serde(flatten)]
    pub stats: PersistenceStats,
}

/// Full stats response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub uptime_secs: u64,
    pub pipeline: PipelineStats,
    pub persistence: PersistenceView,
    pub stream: TapStats,
    pub rotation: RotationStatus,
    /// Absent when rate limiting is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitSnapshot>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/stats", get(stats))
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.pipeline.stats();
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        backend: state.pipeline.persistence().backend_name(),
        logs: stats.logs,
        monitoring: stats.monitoring,
        rotation_state: state.scheduler.state(Utc::now()),
        last_rotation: state.scheduler.last_rotation(),
    })
}

/// GET /api/stats
async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let persistence = state.pipeline.persistence();
    Json(StatsResponse {
        uptime_secs: state.uptime_secs(),
        pipeline: state.pipeline.stats(),
        persistence: PersistenceView {
            backend: persistence.backend_name(),
            stats: persistence.stats(),
        },
        stream: state.tap().stats(),
        rotation: state.scheduler.status().await,
        rate_limit: state.limiter.as_ref().map(|l| l.snapshot()),
    })
}
