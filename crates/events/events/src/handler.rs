//! Event handler trait and types.

use async_trait::async_trait;

use crate::error::EventError;
use crate::event::PostEvent;

/// Result of handling an event.
#[derive(Debug, Clone)]
pub struct HandlerResult {
    /// Handler identifier.
    pub handler_id: String,
    /// Whether the handler succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl HandlerResult {
    /// Creates a successful result.
    pub fn success(handler_id: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            handler_id: handler_id.into(),
            success: true,
            error: None,
            duration_ms,
        }
    }

    /// Creates a failed result.
    pub fn failure(handler_id: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            handler_id: handler_id.into(),
            success: false,
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// Trait for post event handlers.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Returns a unique identifier for this handler.
    fn id(&self) -> &str {
        "anonymous"
    }

    /// Handles an event.
    async fn handle(&self, event: &PostEvent) -> Result<(), EventError>;
}
