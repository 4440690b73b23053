//! Storage error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by backends and the archive store
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Document could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQL backend failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into an entry
    #[error("corrupt {table} row '{id}': {message}")]
    CorruptRow {
        table: &'static str,
        id: String,
        message: String,
    },

    /// LZ4 frame failure
    #[error("compression error: {0}")]
    Compression(String),

    /// Unknown archive file
    #[error("archive not found: {0}")]
    ArchiveNotFound(String),

    /// Archive name outside the archive naming scheme
    #[error("invalid archive name: {0}")]
    InvalidArchiveName(String),
}

impl StorageError {
    /// Create an Io error bound to a path
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a CorruptRow error
    pub fn corrupt(table: &'static str, id: impl Into<String>, message: impl ToString) -> Self {
        Self::CorruptRow {
            table,
            id: id.into(),
            message: message.to_string(),
        }
    }

    /// Check if this is a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ArchiveNotFound(_))
    }
}
