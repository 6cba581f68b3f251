//! HTTP routes.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value};

use agora_events::{EventKind, PostEvent};
use agora_webhooks::{ConnectivityReport, SIGNATURE_HEADER, SubscriptionType};
use agora_webhooks_sdk::{
    CreatedSubscription, SubscriptionConfig, SubscriptionSummary, SubscriptionUpdate,
    WebhookExtractor, verify_webhook,
};

use crate::AppState;
use crate::auth::AdminAuth;
use crate::error::ApiError;

/// Creates the router with every Agora route.
///
/// # Example
///
/// ```rust,ignore
/// let app = routes::router(state);
/// axum::serve(listener, app).await?;
/// ```
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/admin/webhooks",
            get(list_subscriptions).post(create_subscription),
        )
        .route("/api/admin/webhooks/test", post(test_subscription))
        .route(
            "/api/admin/webhooks/{id}",
            get(get_subscription)
                .patch(update_subscription)
                .delete(delete_subscription),
        )
        .route("/api/webhooks/inbound", post(receive_inbound))
        .route("/internal/events", post(ingest_event))
        .with_state(state)
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSubscriptionRequest {
    url: String,
    events: Vec<EventKind>,
    #[serde(rename = "type", default)]
    subscription_type: SubscriptionType,
    description: Option<String>,
}

impl From<CreateSubscriptionRequest> for SubscriptionConfig {
    fn from(req: CreateSubscriptionRequest) -> Self {
        let config = SubscriptionConfig::new(req.url)
            .events(req.events)
            .subscription_type(req.subscription_type);
        match req.description.filter(|d| !d.is_empty()) {
            Some(description) => config.description(description),
            None => config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TestSubscriptionRequest {
    url: String,
    #[serde(rename = "type", default)]
    subscription_type: SubscriptionType,
}

#[derive(Debug, Deserialize)]
struct IngestEventRequest {
    event: String,
    #[serde(default)]
    data: Map<String, Value>,
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_subscription(
    _: AdminAuth,
    State(state): State<AppState>,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedSubscription>), ApiError> {
    let Json(req) = payload?;
    let created = state.admin.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_subscriptions(
    _: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubscriptionSummary>>, ApiError> {
    Ok(Json(state.admin.list().await?))
}

async fn get_subscription(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionSummary>, ApiError> {
    Ok(Json(state.admin.get(&id).await?))
}

async fn update_subscription(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SubscriptionUpdate>, JsonRejection>,
) -> Result<Json<SubscriptionSummary>, ApiError> {
    let Json(update) = payload?;
    Ok(Json(state.admin.update(&id, update).await?))
}

async fn delete_subscription(
    _: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.admin.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn test_subscription(
    _: AdminAuth,
    State(state): State<AppState>,
    payload: Result<Json<TestSubscriptionRequest>, JsonRejection>,
) -> Result<Json<ConnectivityReport>, ApiError> {
    let Json(req) = payload?;
    let report = state
        .admin
        .test_connectivity(&req.url, req.subscription_type)
        .await?;
    Ok(Json(report))
}

/// Raw inbound request as seen by the verifier.
struct InboundRequest<'a> {
    headers: &'a HeaderMap,
    body: &'a [u8],
}

impl WebhookExtractor for InboundRequest<'_> {
    fn signature(&self) -> Option<&str> {
        self.headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
    }

    fn body(&self) -> &[u8] {
        self.body
    }
}

async fn receive_inbound(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let Some(client) = state.inbound.as_deref() else {
        return Err(ApiError::Unauthorized(
            "inbound webhooks are not configured".to_string(),
        ));
    };

    let request = InboundRequest {
        headers: &headers,
        body: &body,
    };
    let event = verify_webhook(client, &request)?;

    tracing::info!(
        event = %event.kind,
        post_id = event.post_id().as_deref().unwrap_or_default(),
        "Inbound webhook accepted"
    );

    Ok(Json(serde_json::json!({ "received": true, "event": event.kind })))
}

async fn ingest_event(
    _: AdminAuth,
    State(state): State<AppState>,
    payload: Result<Json<IngestEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(req) = payload?;
    let kind: EventKind = req.event.parse()?;
    let event = PostEvent::new(kind, req.data);
    event.validate()?;

    state.emitter.emit(event).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "accepted": true, "event": kind })),
    ))
}
