//! Webhook error types.

use thiserror::Error;

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Error type for webhook operations.
///
/// Transport, protocol and payload failures all count as one failed
/// delivery for the subscription's failure counter; the variants only
/// exist so logs and tests can tell them apart.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Invalid signature.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Invalid payload.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Request could not be sent or the connection failed.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Receiver answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Response status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Timeout.
    #[error("Request timeout")]
    Timeout,

    /// Subscription not found.
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    /// Validation failed on a subscription or request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::InvalidPayload(err.to_string())
    }
}

impl From<reqwest::Error> for WebhookError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WebhookError::Timeout
        } else {
            WebhookError::HttpError(err.without_url().to_string())
        }
    }
}
