//! Pipeline error types
//!
//! Only validation, lookup and rotation errors reach callers. Persistence
//! failures are absorbed by `pulse_storage::Persistence` and never appear
//! here.

use thiserror::Error;

use pulse_storage::StorageError;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required field is missing or has an unusable value
    #[error("invalid {field}: {message}")]
    Validation {
        /// Offending field (e.g. "message", "level")
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// One item of a fail-fast batch was invalid; nothing was inserted
    #[error("batch item {index} rejected: {source}")]
    BatchRejected {
        /// Position of the first invalid item
        index: usize,
        /// Why it was rejected
        #[source]
        source: Box<PipelineError>,
    },

    /// Batch exceeds the configured item limit
    #[error("batch of {size} items exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Unknown entity
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A rotation is already running
    #[error("rotation already in progress")]
    RotationInProgress,

    /// Archive read/write failed
    #[error("archive error: {0}")]
    Archive(#[from] StorageError),
}

impl PipelineError {
    /// Create a Validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Field name for validation failures, looking through batch wrappers
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::BatchRejected { source, .. } => source.field(),
            _ => None,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
