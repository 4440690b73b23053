//! Error types for the tap crate

use thiserror::Error;

/// Errors that can occur in the fan-out layer
#[derive(Error, Debug)]
pub enum TapError {
    /// Client frame could not be understood
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Frame encoding failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Maximum subscribers reached
    #[error("maximum subscribers reached ({max})")]
    MaxSubscribers { max: usize },

    /// Subscriber not found
    #[error("subscriber not found: {id}")]
    SubscriberNotFound { id: u64 },
}

/// Result type for tap operations
pub type Result<T> = std::result::Result<T, TapError>;
