//! Source registry endpoints

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use pulse_pipeline::Registration;
use pulse_protocol::Source;

use crate::error::Result;
use crate::ratelimit::RateLimitLayer;
use crate::routes::json_body;
use crate::state::AppState;

/// Source listing
#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub count: usize,
    pub sources: Vec<Source>,
}

pub fn routes(limit: RateLimitLayer) -> Router<AppState> {
    Router::new()
        .route("/api/sources/register", post(register).layer(limit))
        .route("/api/sources", get(list_sources))
        .route("/api/sources/{id}", get(get_source))
}

/// POST /api/sources/register
async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Source>)> {
    let registration: Registration = json_body(&body)?;
    let source = state.pipeline.register_source(registration).await?;
    Ok((StatusCode::CREATED, Json(source)))
}

/// GET /api/sources
async fn list_sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    let sources = state.pipeline.sources();
    Json(SourcesResponse {
        count: sources.len(),
        sources,
    })
}

/// GET /api/sources/{id}
async fn get_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Source>> {
    Ok(Json(state.pipeline.source(&id)?))
}
