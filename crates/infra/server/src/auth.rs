//! Admin authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use subtle::ConstantTimeEq;

use crate::AppState;
use crate::error::ApiError;

/// Proof that the request carried the admin bearer token.
///
/// When no admin secret is configured every request passes.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(_: AdminAuth, State(state): State<AppState>) -> ... { }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_secret.as_deref() else {
            return Ok(AdminAuth);
        };

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

        if bool::from(token.trim().as_bytes().ct_eq(expected.as_bytes())) {
            Ok(AdminAuth)
        } else {
            tracing::warn!("Rejected admin request with invalid token");
            Err(ApiError::Unauthorized("invalid bearer token".to_string()))
        }
    }
}
