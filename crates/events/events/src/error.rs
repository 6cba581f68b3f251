//! Event error types.

use thiserror::Error;

/// Result type for event operations.
pub type EventResult<T> = Result<T, EventError>;

/// Error type for event handling.
#[derive(Debug, Error)]
pub enum EventError {
    /// Handler execution failed.
    #[error("Handler failed: {0}")]
    HandlerFailed(String),

    /// Event serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Event kind string is not one of the known kinds.
    #[error("Unknown event kind: {0}")]
    UnknownEventKind(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::SerializationError(err.to_string())
    }
}
