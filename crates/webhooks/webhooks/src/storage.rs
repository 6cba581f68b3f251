//! Subscription storage trait for persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use agora_events::EventKind;

use crate::error::{WebhookError, WebhookResult};
use crate::subscription::{SubscriptionPatch, WebhookSubscription};

/// Trait for subscription storage backends.
///
/// Counter updates are per-row read-modify-write operations. Concurrent
/// dispatch cycles touching the same subscription may interleave; the
/// failure counter is eventually consistent, not serializable.
///
/// Administrative edits go through [`SubscriptionStore::patch_subscription`]
/// rather than `save_subscription`, so they never overwrite counters or an
/// auto-disable that landed in the meantime.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    // ==================== Administrative Operations ====================

    /// Inserts or replaces a subscription.
    async fn save_subscription(&self, subscription: &WebhookSubscription) -> WebhookResult<()>;

    /// Gets a subscription by ID.
    async fn get_subscription(&self, id: &str) -> WebhookResult<Option<WebhookSubscription>>;

    /// Lists all subscriptions.
    async fn list_subscriptions(&self) -> WebhookResult<Vec<WebhookSubscription>>;

    /// Applies a patch to the administrator-owned fields of one subscription
    /// as a single read-modify-write, leaving delivery counters intact.
    /// Returns the updated subscription, or `None` if it does not exist.
    async fn patch_subscription(
        &self,
        id: &str,
        patch: SubscriptionPatch,
    ) -> WebhookResult<Option<WebhookSubscription>>;

    /// Deletes a subscription. Returns whether it existed.
    async fn delete_subscription(&self, id: &str) -> WebhookResult<bool>;

    // ==================== Dispatch Operations ====================

    /// Lists active subscriptions subscribed to `kind`.
    async fn list_active_for_event(&self, kind: EventKind) -> WebhookResult<Vec<WebhookSubscription>>;

    /// Increments the failure counter and returns the new value.
    async fn increment_failure(&self, id: &str) -> WebhookResult<u32>;

    /// Resets the failure counter and stamps the last successful delivery.
    async fn record_success(&self, id: &str, at: DateTime<Utc>) -> WebhookResult<()>;

    /// Marks a subscription inactive.
    async fn disable(&self, id: &str) -> WebhookResult<()>;
}

/// In-memory subscription storage.
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<HashMap<String, WebhookSubscription>>,
}

impl InMemorySubscriptionStore {
    /// Creates a new in-memory storage.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn save_subscription(&self, subscription: &WebhookSubscription) -> WebhookResult<()> {
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.insert(subscription.id.clone(), subscription.clone());
        Ok(())
    }

    async fn get_subscription(&self, id: &str) -> WebhookResult<Option<WebhookSubscription>> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions.get(id).cloned())
    }

    async fn list_subscriptions(&self) -> WebhookResult<Vec<WebhookSubscription>> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions.values().cloned().collect())
    }

    async fn patch_subscription(
        &self,
        id: &str,
        patch: SubscriptionPatch,
    ) -> WebhookResult<Option<WebhookSubscription>> {
        let mut subscriptions = self.subscriptions.write().await;
        Ok(subscriptions.get_mut(id).map(|subscription| {
            patch.apply_to(subscription);
            subscription.clone()
        }))
    }

    async fn delete_subscription(&self, id: &str) -> WebhookResult<bool> {
        let mut subscriptions = self.subscriptions.write().await;
        Ok(subscriptions.remove(id).is_some())
    }

    async fn list_active_for_event(&self, kind: EventKind) -> WebhookResult<Vec<WebhookSubscription>> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions
            .values()
            .filter(|s| s.should_receive(kind))
            .cloned()
            .collect())
    }

    async fn increment_failure(&self, id: &str) -> WebhookResult<u32> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions
            .get_mut(id)
            .ok_or_else(|| WebhookError::SubscriptionNotFound(id.to_string()))?;
        Ok(subscription.mark_failure())
    }

    async fn record_success(&self, id: &str, at: DateTime<Utc>) -> WebhookResult<()> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions
            .get_mut(id)
            .ok_or_else(|| WebhookError::SubscriptionNotFound(id.to_string()))?;
        subscription.mark_success(at);
        Ok(())
    }

    async fn disable(&self, id: &str) -> WebhookResult<()> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions
            .get_mut(id)
            .ok_or_else(|| WebhookError::SubscriptionNotFound(id.to_string()))?;
        subscription.is_active = false;
        subscription.updated_at = Utc::now();
        Ok(())
    }
}
