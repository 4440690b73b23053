//! API routes
//!
//! Domain-grouped HTTP route handlers.

pub mod logs;
pub mod monitoring;
pub mod ops;
pub mod rotation;
pub mod sources;
pub mod stream;

use axum::Router;
use axum::body::Bytes;
use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::http::{HeaderMap, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, Result};
use crate::ratelimit::{RateLimitLayer, SOURCE_HEADER};
use crate::state::AppState;

/// Options for building the router
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Maximum request body size; axum's default when `None`
    pub max_payload_bytes: Option<usize>,
    /// Permissive CORS for browser dashboards
    pub cors: bool,
}

/// Build the complete API router
pub fn build_router(state: AppState) -> Router {
    build_router_with_options(state, RouterOptions::default())
}

/// Build the complete API router with options
pub fn build_router_with_options(state: AppState, options: RouterOptions) -> Router {
    let limit = RateLimitLayer::new(state.limiter.clone());

    let router = Router::new()
        // Operations routes (health, stats)
        .merge(ops::routes())
        // Ingestion and queries
        .merge(logs::routes(limit.clone()))
        .merge(monitoring::routes(limit.clone()))
        .merge(sources::routes(limit))
        // Live streams
        .merge(stream::routes())
        // Rotation and archives
        .merge(rotation::routes())
        .layer(TraceLayer::new_for_http());

    let router = match options.max_payload_bytes {
        Some(max) => router.layer(axum::extract::DefaultBodyLimit::max(max)),
        None => router,
    };

    let router = if options.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

// =============================================================================
// Request helpers
// =============================================================================

/// `x-source-id` header, if present and non-blank
pub(crate) fn source_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SOURCE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Decode an ingestion body
///
/// JSON content types must parse. `text/*` bodies are taken verbatim as a
/// raw-text entry. Without a content type the body is tried as JSON and
/// otherwise taken as text.
pub(crate) fn payload(headers: &HeaderMap, body: &Bytes) -> Result<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.contains("json") {
        return serde_json::from_slice(body)
            .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")));
    }

    let text = || Value::String(String::from_utf8_lossy(body).into_owned());
    if content_type.starts_with("text/") {
        return Ok(text());
    }
    Ok(serde_json::from_slice(body).unwrap_or_else(|_| text()))
}

/// Decode a JSON body into `T`
pub(crate) fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
}

/// Unwrap query parameters, turning axum's rejection into an API error
pub(crate) fn query<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(content_type: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        headers
    }

    #[test]
    fn test_payload_json() {
        let body = Bytes::from_static(br#"{"message":"hi"}"#);
        let value = payload(&headers(Some("application/json")), &body).unwrap();
        assert_eq!(value["message"], "hi");

        let bad = Bytes::from_static(b"{not json");
        assert!(matches!(
            payload(&headers(Some("application/json")), &bad),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_payload_text() {
        let body = Bytes::from_static(br#"{"looks":"like json"}"#);
        let value = payload(&headers(Some("text/plain")), &body).unwrap();
        assert_eq!(value, Value::String(r#"{"looks":"like json"}"#.into()));

        let body = Bytes::from_static(b"disk almost full");
        let value = payload(&headers(None), &body).unwrap();
        assert_eq!(value, Value::String("disk almost full".into()));

        let body = Bytes::from_static(b"[1,2]");
        assert!(payload(&headers(None), &body).unwrap().is_array());
    }

    #[test]
    fn test_source_header() {
        let mut map = HeaderMap::new();
        assert_eq!(source_header(&map), None);
        map.insert(SOURCE_HEADER, HeaderValue::from_static("  "));
        assert_eq!(source_header(&map), None);
        map.insert(SOURCE_HEADER, HeaderValue::from_static("web"));
        assert_eq!(source_header(&map), Some("web"));
    }
}
