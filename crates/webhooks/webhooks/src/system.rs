//! Webhook system - main entry point.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use agora_events::{EventError, EventHandler, EventKind, PostEvent};

use crate::circuit_breaker::CircuitBreaker;
use crate::delivery::{DeliveryClient, PreparedDelivery};
use crate::error::{WebhookError, WebhookResult};
use crate::signature::generate_secret;
use crate::storage::SubscriptionStore;
use crate::subscription::{SubscriptionType, WebhookSubscription};

/// Default per-delivery timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of consecutive failures before a subscription is disabled.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Webhook system configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Timeout for one delivery, covering connect, write and read.
    pub timeout: Duration,
    /// Consecutive failures that disable a subscription.
    pub failure_threshold: u32,
    /// User agent sent with deliveries.
    pub user_agent: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            user_agent: concat!("agora-webhooks/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl WebhookConfig {
    /// Creates a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delivery timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the auto-disable threshold.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }
}

/// What happened during one dispatch cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// Number of subscriptions the event was sent to.
    pub matched: usize,
    /// Subscriptions that accepted the delivery.
    pub succeeded: Vec<String>,
    /// Subscriptions whose delivery failed.
    pub failed: Vec<String>,
    /// Subscriptions disabled during this cycle.
    pub disabled: Vec<String>,
}

/// Verdict of a connectivity test against an unsaved endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityReport {
    /// Whether the endpoint answered with 2xx.
    pub success: bool,
    /// Human-readable explanation.
    pub message: String,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
}

enum DeliveryOutcome {
    Succeeded,
    Failed { disabled: bool },
}

/// Fans post events out to matching webhook subscriptions.
pub struct WebhookDispatcher {
    store: Arc<dyn SubscriptionStore>,
    client: DeliveryClient,
    breaker: CircuitBreaker,
    config: WebhookConfig,
}

impl WebhookDispatcher {
    /// Creates a dispatcher over the given store.
    pub fn new(store: Arc<dyn SubscriptionStore>, config: WebhookConfig) -> WebhookResult<Self> {
        let client = DeliveryClient::new(&config)?;
        let breaker = CircuitBreaker::new(store.clone(), config.failure_threshold);

        Ok(Self {
            store,
            client,
            breaker,
            config,
        })
    }

    /// Fires webhooks for a post mutation and returns immediately.
    ///
    /// The dispatch cycle runs on a detached task; the caller never sees
    /// its outcome and is never failed by it.
    pub fn trigger_webhooks(self: &Arc<Self>, kind: EventKind, data: Map<String, Value>) {
        self.trigger(PostEvent::new(kind, data));
    }

    /// Fires webhooks for an already built event and returns immediately.
    pub fn trigger(self: &Arc<Self>, event: PostEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                event = %event.kind,
                "No async runtime available, dropping webhook event"
            );
            return;
        };

        let dispatcher = Arc::clone(self);
        runtime.spawn(async move {
            dispatcher.handle_event(&event).await;
        });
    }

    /// Runs one dispatch cycle and swallows every error.
    pub async fn handle_event(&self, event: &PostEvent) {
        match self.dispatch(event).await {
            Ok(summary) if summary.matched > 0 => {
                tracing::info!(
                    event = %event.kind,
                    matched = summary.matched,
                    succeeded = summary.succeeded.len(),
                    failed = summary.failed.len(),
                    disabled = summary.disabled.len(),
                    "Webhook dispatch complete"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(event = %event.kind, error = %e, "Webhook dispatch failed");
            }
        }
    }

    /// Runs one dispatch cycle.
    ///
    /// Deliveries run concurrently and each one's outcome is recorded as
    /// soon as it settles, so a slow receiver never holds back another.
    /// Only a failure to look up subscriptions is returned as an error.
    pub async fn dispatch(&self, event: &PostEvent) -> WebhookResult<DispatchSummary> {
        let subscriptions = self.store.list_active_for_event(event.kind).await?;
        if subscriptions.is_empty() {
            return Ok(DispatchSummary::default());
        }

        let deliveries = subscriptions
            .iter()
            .map(|subscription| async move {
                let outcome = self.deliver_and_record(subscription, event).await;
                (subscription.id.clone(), outcome)
            });
        let outcomes = futures::future::join_all(deliveries).await;

        let mut summary = DispatchSummary {
            matched: subscriptions.len(),
            ..DispatchSummary::default()
        };
        for (id, outcome) in outcomes {
            match outcome {
                DeliveryOutcome::Succeeded => summary.succeeded.push(id),
                DeliveryOutcome::Failed { disabled } => {
                    if disabled {
                        summary.disabled.push(id.clone());
                    }
                    summary.failed.push(id);
                }
            }
        }

        Ok(summary)
    }

    async fn deliver_and_record(
        &self,
        subscription: &WebhookSubscription,
        event: &PostEvent,
    ) -> DeliveryOutcome {
        match self.client.deliver(subscription, event).await {
            Ok(report) => {
                tracing::debug!(
                    subscription_id = %subscription.id,
                    event = %event.kind,
                    status = report.status,
                    duration_ms = report.duration_ms,
                    "Webhook delivered"
                );
                if let Err(e) = self.breaker.record_success(subscription, Utc::now()).await {
                    tracing::error!(
                        subscription_id = %subscription.id,
                        error = %e,
                        "Failed to record webhook success"
                    );
                }
                DeliveryOutcome::Succeeded
            }
            Err(e) => {
                tracing::warn!(
                    subscription_id = %subscription.id,
                    event = %event.kind,
                    error = %e,
                    "Webhook delivery failed"
                );
                match self.breaker.record_failure(subscription).await {
                    Ok(state) => DeliveryOutcome::Failed {
                        disabled: state.is_open(),
                    },
                    Err(e) => {
                        tracing::error!(
                            subscription_id = %subscription.id,
                            error = %e,
                            "Failed to record webhook failure"
                        );
                        DeliveryOutcome::Failed { disabled: false }
                    }
                }
            }
        }
    }

    /// Sends a sample event to an endpoint that is not stored yet.
    ///
    /// Uses the same transformer and client as real deliveries. Generic
    /// requests are signed with a throwaway secret.
    pub async fn test_connectivity(
        &self,
        url: &str,
        subscription_type: SubscriptionType,
    ) -> ConnectivityReport {
        let event = PostEvent::builder(EventKind::PostCreated, "test")
            .title("웹훅 연결 테스트")
            .content("Agora 웹훅 연결을 확인하기 위한 테스트 메시지입니다.")
            .build();

        let secret = generate_secret();
        let result = match PreparedDelivery::build(url, subscription_type, &secret, &event) {
            Ok(prepared) => self.client.send(prepared).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(report) => ConnectivityReport {
                success: true,
                message: format!("Endpoint responded with HTTP {}", report.status),
                status: Some(report.status),
            },
            Err(WebhookError::HttpStatus { status, .. }) => ConnectivityReport {
                success: false,
                message: format!("Endpoint responded with HTTP {status}"),
                status: Some(status),
            },
            Err(e) => ConnectivityReport {
                success: false,
                message: format!("Could not reach endpoint: {e}"),
                status: None,
            },
        }
    }

    /// Gets the subscription store.
    pub fn store(&self) -> &Arc<dyn SubscriptionStore> {
        &self.store
    }

    /// Gets the configuration.
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl EventHandler for WebhookDispatcher {
    fn id(&self) -> &str {
        "webhook-dispatcher"
    }

    async fn handle(&self, event: &PostEvent) -> Result<(), EventError> {
        self.handle_event(event).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemorySubscriptionStore;

    #[test]
    fn test_default_config() {
        let config = WebhookConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.failure_threshold, 5);
        assert!(config.user_agent.starts_with("agora-webhooks/"));
    }

    #[tokio::test]
    async fn test_dispatch_without_subscriptions_is_noop() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let dispatcher = WebhookDispatcher::new(store, WebhookConfig::default()).unwrap();

        let event = PostEvent::builder(EventKind::PostCreated, "p1").build();
        let summary = dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(summary.matched, 0);
        assert!(summary.succeeded.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_skips_unsubscribed_and_inactive() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let other_kind = WebhookSubscription::new(
            "http://127.0.0.1:1/a",
            "s",
            [EventKind::PostDeleted],
            SubscriptionType::Generic,
        );
        let inactive = WebhookSubscription::new(
            "http://127.0.0.1:1/b",
            "s",
            [EventKind::PostCreated],
            SubscriptionType::Generic,
        )
        .disabled();
        store.save_subscription(&other_kind).await.unwrap();
        store.save_subscription(&inactive).await.unwrap();

        let dispatcher = WebhookDispatcher::new(store.clone(), WebhookConfig::default()).unwrap();
        let event = PostEvent::builder(EventKind::PostCreated, "p1").build();
        let summary = dispatcher.dispatch(&event).await.unwrap();

        assert_eq!(summary.matched, 0);
        let untouched = store.get_subscription(&inactive.id).await.unwrap().unwrap();
        assert_eq!(untouched.failure_count, 0);
    }

    #[tokio::test]
    async fn test_connectivity_rejects_unreachable_endpoint() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let dispatcher = WebhookDispatcher::new(store, WebhookConfig::default()).unwrap();

        let report = dispatcher
            .test_connectivity("http://127.0.0.1:1/hook", SubscriptionType::Slack)
            .await;
        assert!(!report.success);
        assert!(report.status.is_none());
    }
}
