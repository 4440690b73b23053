//! API error types
//!
//! Provides structured error responses for the HTTP API.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use pulse_pipeline::PipelineError;
use pulse_storage::StorageError;
use pulse_tap::TapError;

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request parameters or body
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation conflicts with one already running
    #[error("conflict: {0}")]
    Conflict(String),

    /// Validation error
    #[error("validation error: {field} - {message}")]
    Validation {
        field: String,
        message: String,
        details: Option<Value>,
    },

    /// Admission denied by the rate limiter
    #[error("rate limit exceeded, retry in {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// Capacity exhausted (e.g. stream subscriber limit)
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    // Helper constructors

    /// Create a bad request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{} '{}' not found", entity, id))
    }

    /// Create a validation error
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::Validation { field, details, .. } => {
                let mut details = details.clone().unwrap_or_else(|| json!({}));
                if let Some(map) = details.as_object_mut() {
                    map.insert("field".into(), Value::String(field.clone()));
                }
                Some(details)
            }
            Self::RateLimited { retry_after } => Some(json!({ "retryAfter": retry_after })),
            _ => None,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation { field, message } => Self::Validation {
                field,
                message,
                details: None,
            },
            PipelineError::BatchRejected { index, source } => {
                let field = source.field().unwrap_or("body").to_string();
                Self::Validation {
                    field,
                    message: format!("batch item {index}: {source}"),
                    details: Some(json!({ "index": index })),
                }
            }
            PipelineError::BatchTooLarge { size, max } => Self::Validation {
                field: "body".into(),
                message: format!("batch of {size} items exceeds the limit of {max}"),
                details: Some(json!({ "size": size, "max": max })),
            },
            PipelineError::NotFound { kind, id } => Self::not_found(kind, &id),
            PipelineError::RotationInProgress => Self::Conflict("rotation already in progress".into()),
            PipelineError::Archive(e) => e.into(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ArchiveNotFound(name) => Self::not_found("archive", &name),
            StorageError::InvalidArchiveName(name) => {
                Self::BadRequest(format!("invalid archive name '{}'", name))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<TapError> for ApiError {
    fn from(err: TapError) -> Self {
        match err {
            TapError::MaxSubscribers { max } => {
                Self::Unavailable(format!("maximum stream subscribers reached ({max})"))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Inner error object
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error code (machine-readable)
    pub code: &'static str,
    /// Error message (human-readable)
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        tracing::warn!(
            error_code = body.error.code,
            error_message = %body.error.message,
            status = %status,
            "API error"
        );

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, header::HeaderValue::from(retry_after));
        }
        response
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_mapping() {
        let err: ApiError = PipelineError::validation("level", "must be one of info").into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err: ApiError = PipelineError::BatchRejected {
            index: 2,
            source: Box::new(PipelineError::validation("message", "is required")),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let details = err.details().unwrap();
        assert_eq!(details["index"], 2);
        assert_eq!(details["field"], "message");

        let err: ApiError = PipelineError::not_found("log", "abc").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = PipelineError::RotationInProgress.into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: ApiError = StorageError::ArchiveNotFound("archive_x.json".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = StorageError::InvalidArchiveName("../etc".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = StorageError::Compression("bad frame".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError = TapError::MaxSubscribers { max: 2 }.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after: 7 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");
    }
}
