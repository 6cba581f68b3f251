//! API errors and their HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use agora_events::EventError;
use agora_webhooks::WebhookError;

/// Error returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Validation(msg) | WebhookError::InvalidPayload(msg) => {
                ApiError::BadRequest(msg)
            }
            err @ WebhookError::InvalidSignature => ApiError::Unauthorized(err.to_string()),
            WebhookError::SubscriptionNotFound(id) => {
                ApiError::NotFound(format!("webhook subscription not found: {id}"))
            }
            other => {
                tracing::error!(error = %other, "Webhook operation failed");
                ApiError::Internal("internal error".to_string())
            }
        }
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        match err {
            err @ (EventError::UnknownEventKind(_)
            | EventError::InvalidInput(_)
            | EventError::SerializationError(_)) => ApiError::BadRequest(err.to_string()),
            other => {
                tracing::error!(error = %other, "Event handling failed");
                ApiError::Internal("internal error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
