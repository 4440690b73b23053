//! Pulse API
//!
//! HTTP surface for the telemetry ingestion server.
//!
//! # Overview
//!
//! Built on Axum. Handlers are thin: they decode the request, call the
//! [`Pipeline`](pulse_pipeline::Pipeline) or
//! [`RotationScheduler`](pulse_pipeline::RotationScheduler) and encode the
//! result. Ingestion routes sit behind the fixed-window [`RateLimitLayer`].
//!
//! # Usage
//!
//! ```ignore
//! use pulse_api::{AppState, RateLimiter, build_router};
//!
//! let state = AppState::new(pipeline, scheduler)
//!     .with_rate_limiter(RateLimiter::new(&config.rate_limit))
//!     .with_heartbeat(config.stream.heartbeat);
//! let app = build_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3100").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! # Endpoints
//!
//! ## Ingestion
//! - `POST /api/logs` - Single log, raw text, or fail-fast batch
//! - `POST /api/monitoring` - Single monitoring entry or fail-fast batch
//! - `POST /api/import` - Best-effort bulk import with per-item errors
//! - `POST /api/sources/register` - Register or refresh a source
//!
//! ## Queries
//! - `GET /api/logs`, `GET /api/logs/{id}` - Filter by source, level, script,
//!   time range, text; paginate with `offset`/`limit`
//! - `GET /api/monitoring` - Filter by source, module, script, type, name
//! - `GET /api/monitoring/structure` - Latest entry per name
//! - `GET /api/sources`, `GET /api/sources/{id}`
//! - `DELETE /api/logs`, `DELETE /api/monitoring` - Bulk delete
//!
//! ## Live streams
//! - `GET /ws` - Push stream (WebSocket) with a replaceable filter
//! - `GET /api/logs/stream`, `GET /api/monitoring/stream`, `GET /api/stream` -
//!   Pull streams (SSE) with replay
//!
//! ## Rotation
//! - `POST /api/rotation/trigger`, `GET /api/rotation/status`
//! - `GET /api/archives`, `GET /api/archives/{name}`
//!
//! ## Operations
//! - `GET /health`, `GET /api/stats`
//!
//! # Request Headers
//!
//! - `x-source-id` - Source for entries that do not name one; also the rate
//!   limit key

pub mod error;
pub mod ratelimit;
pub mod routes;
pub mod state;

// Re-exports
pub use error::{ApiError, Result};
pub use ratelimit::{RateLimitLayer, RateLimiter};
pub use routes::{RouterOptions, build_router, build_router_with_options};
pub use state::AppState;
