//! Administrative operations on webhook subscriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use agora_events::EventKind;
use agora_webhooks::{
    ConnectivityReport, SubscriptionPatch, SubscriptionStore, SubscriptionType, WebhookDispatcher,
    WebhookError, WebhookResult, WebhookSubscription,
};

use crate::builder::{SubscriptionConfig, validate_events, validate_url};

/// Subscription as shown to administrators. Never carries the secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    /// Subscription identifier.
    pub id: String,
    /// Endpoint that receives deliveries.
    pub url: String,
    /// Subscribed event kinds, sorted by name.
    pub events: Vec<EventKind>,
    /// Payload format.
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    /// Whether deliveries are attempted.
    pub is_active: bool,
    /// Consecutive failed deliveries.
    pub failure_count: u32,
    /// Time of the last successful delivery.
    pub last_triggered_at: Option<DateTime<Utc>>,
    /// Free-form note.
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&WebhookSubscription> for SubscriptionSummary {
    fn from(sub: &WebhookSubscription) -> Self {
        let mut events: Vec<EventKind> = sub.events.iter().copied().collect();
        events.sort_by_key(|kind| kind.as_str());

        Self {
            id: sub.id.clone(),
            url: sub.url.clone(),
            events,
            subscription_type: sub.subscription_type,
            is_active: sub.is_active,
            failure_count: sub.failure_count,
            last_triggered_at: sub.last_triggered_at,
            description: sub.description.clone(),
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

/// Result of creating a subscription: the only time the secret is returned.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedSubscription {
    /// The stored subscription.
    pub subscription: SubscriptionSummary,
    /// Signing secret for verifying deliveries.
    pub secret: String,
}

/// Partial update of a subscription. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
    /// New endpoint URL; must be http or https.
    pub url: Option<String>,
    /// New event set; must not be empty.
    pub events: Option<HashSet<EventKind>>,
    /// Enables or disables the subscription. Enabling resets the failure count.
    pub is_active: Option<bool>,
    /// New description; an empty string clears it.
    pub description: Option<String>,
}

impl SubscriptionUpdate {
    /// Validates the requested changes and turns them into a store patch.
    /// An empty description clears it.
    fn into_patch(self) -> WebhookResult<SubscriptionPatch> {
        if let Some(url) = &self.url {
            validate_url(url)?;
        }
        if let Some(events) = &self.events {
            validate_events(events)?;
        }

        Ok(SubscriptionPatch {
            url: self.url,
            events: self.events,
            is_active: self.is_active,
            description: self
                .description
                .map(|description| Some(description).filter(|d| !d.is_empty())),
        })
    }
}

/// Subscription management on top of a store and a dispatcher.
#[derive(Clone)]
pub struct WebhookAdmin {
    store: Arc<dyn SubscriptionStore>,
    dispatcher: Arc<WebhookDispatcher>,
}

impl WebhookAdmin {
    /// Creates an admin over the dispatcher's store.
    pub fn new(dispatcher: Arc<WebhookDispatcher>) -> Self {
        Self {
            store: dispatcher.store().clone(),
            dispatcher,
        }
    }

    /// Registers a new subscription.
    pub async fn create(&self, config: SubscriptionConfig) -> WebhookResult<CreatedSubscription> {
        let subscription = config.into_subscription()?;
        self.store.save_subscription(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            subscription_type = %subscription.subscription_type,
            "Webhook subscription created"
        );

        Ok(CreatedSubscription {
            subscription: SubscriptionSummary::from(&subscription),
            secret: subscription.secret,
        })
    }

    /// Lists subscriptions, newest first.
    pub async fn list(&self) -> WebhookResult<Vec<SubscriptionSummary>> {
        let mut subscriptions = self.store.list_subscriptions().await?;
        subscriptions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subscriptions.iter().map(SubscriptionSummary::from).collect())
    }

    /// Gets one subscription.
    pub async fn get(&self, id: &str) -> WebhookResult<SubscriptionSummary> {
        let subscription = self.load(id).await?;
        Ok(SubscriptionSummary::from(&subscription))
    }

    /// Applies a partial update. The payload format cannot be changed, and
    /// delivery counters are left to the dispatcher except that
    /// re-activation resets the failure count.
    pub async fn update(
        &self,
        id: &str,
        update: SubscriptionUpdate,
    ) -> WebhookResult<SubscriptionSummary> {
        let patch = update.into_patch()?;
        let subscription = self
            .store
            .patch_subscription(id, patch)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(id.to_string()))?;

        tracing::info!(
            subscription_id = %subscription.id,
            is_active = subscription.is_active,
            "Webhook subscription updated"
        );

        Ok(SubscriptionSummary::from(&subscription))
    }

    /// Removes a subscription.
    pub async fn delete(&self, id: &str) -> WebhookResult<()> {
        if !self.store.delete_subscription(id).await? {
            return Err(WebhookError::SubscriptionNotFound(id.to_string()));
        }
        tracing::info!(subscription_id = %id, "Webhook subscription deleted");
        Ok(())
    }

    /// Sends a sample event to an unsaved endpoint.
    pub async fn test_connectivity(
        &self,
        url: &str,
        subscription_type: SubscriptionType,
    ) -> WebhookResult<ConnectivityReport> {
        validate_url(url)?;
        Ok(self.dispatcher.test_connectivity(url, subscription_type).await)
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Arc<WebhookDispatcher> {
        &self.dispatcher
    }

    async fn load(&self, id: &str) -> WebhookResult<WebhookSubscription> {
        self.store
            .get_subscription(id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(id.to_string()))
    }
}
