//! Single-request webhook delivery.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use agora_events::PostEvent;

use crate::error::{WebhookError, WebhookResult};
use crate::signature::{EVENT_HEADER, SIGNATURE_HEADER, sign_payload};
use crate::subscription::{SubscriptionType, WebhookSubscription};
use crate::system::WebhookConfig;
use crate::transform::transform;

/// Longest response body kept for failure diagnostics.
const MAX_ERROR_BODY_CHARS: usize = 1000;

/// A fully built request, ready to send.
///
/// The body is serialized exactly once; the signature header is computed
/// over these bytes and the same bytes go on the wire.
#[derive(Debug, Clone)]
pub struct PreparedDelivery {
    /// Target URL.
    pub url: String,
    /// Serialized JSON body.
    pub body: Vec<u8>,
    /// Request headers.
    pub headers: Vec<(&'static str, String)>,
}

impl PreparedDelivery {
    /// Builds the request for an event in the given format.
    pub fn build(
        url: impl Into<String>,
        subscription_type: SubscriptionType,
        secret: &str,
        event: &PostEvent,
    ) -> WebhookResult<Self> {
        let payload = transform(event, subscription_type)?;
        let body = serde_json::to_vec(&payload)?;

        let mut headers = vec![("Content-Type", "application/json".to_string())];
        if subscription_type.is_signed() {
            headers.push((SIGNATURE_HEADER, sign_payload(&body, secret)));
            headers.push((EVENT_HEADER, event.kind.as_str().to_string()));
        }

        Ok(Self {
            url: url.into(),
            body,
            headers,
        })
    }

    /// Builds the request for a stored subscription.
    pub fn for_subscription(
        subscription: &WebhookSubscription,
        event: &PostEvent,
    ) -> WebhookResult<Self> {
        Self::build(
            subscription.url.clone(),
            subscription.subscription_type,
            &subscription.secret,
            event,
        )
    }
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// HTTP status code returned by the receiver.
    pub status: u16,
    /// Round-trip time in milliseconds.
    pub duration_ms: u64,
}

/// HTTP client for webhook deliveries.
///
/// Performs exactly one bounded POST per call. It never retries; failures
/// are reported to the caller, which tracks them on the subscription.
#[derive(Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
}

impl DeliveryClient {
    /// Creates a client using the configured timeout and user agent.
    pub fn new(config: &WebhookConfig) -> WebhookResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| WebhookError::ConfigError(e.to_string()))?;

        Ok(Self { client })
    }

    /// Delivers an event to a subscription.
    pub async fn deliver(
        &self,
        subscription: &WebhookSubscription,
        event: &PostEvent,
    ) -> WebhookResult<DeliveryReport> {
        let prepared = PreparedDelivery::for_subscription(subscription, event)?;
        self.send(prepared).await
    }

    /// Sends a prepared request. Any non-2xx status is an error.
    pub async fn send(&self, prepared: PreparedDelivery) -> WebhookResult<DeliveryReport> {
        let start = Instant::now();

        let mut request = self.client.post(&prepared.url);
        for (key, value) in &prepared.headers {
            request = request.header(*key, value);
        }

        let response = request.body(prepared.body).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(DeliveryReport {
                status: status.as_u16(),
                duration_ms: start.elapsed().as_millis() as u64,
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(WebhookError::HttpStatus {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }
}
