//! Failure tracking and auto-disable for webhook subscriptions.
//!
//! Each subscription behaves like a one-way circuit breaker:
//! - Closed: subscription is active, deliveries go out
//! - Open: too many consecutive failures, subscription is disabled
//!
//! There is no half-open state. An open circuit stays open until an
//! administrator re-activates the subscription.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::WebhookResult;
use crate::storage::SubscriptionStore;
use crate::subscription::WebhookSubscription;

/// Health of a subscription after an outcome has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Subscription stays active.
    Closed {
        failure_count: u32,
    },

    /// Subscription has been disabled.
    Open {
        failure_count: u32,
    },
}

impl CircuitState {
    /// Computes the state for a post-increment failure count.
    pub fn after_failures(failure_count: u32, failure_threshold: u32) -> Self {
        if failure_count >= failure_threshold {
            CircuitState::Open { failure_count }
        } else {
            CircuitState::Closed { failure_count }
        }
    }

    /// Whether the subscription was disabled.
    pub fn is_open(&self) -> bool {
        matches!(self, CircuitState::Open { .. })
    }
}

/// Applies delivery outcomes to stored subscription counters.
pub struct CircuitBreaker {
    store: Arc<dyn SubscriptionStore>,
    failure_threshold: u32,
}

impl CircuitBreaker {
    /// Creates a breaker that disables subscriptions at `failure_threshold` consecutive failures.
    pub fn new(store: Arc<dyn SubscriptionStore>, failure_threshold: u32) -> Self {
        Self {
            store,
            failure_threshold,
        }
    }

    /// Records a successful delivery: resets the counter and stamps `at`.
    pub async fn record_success(
        &self,
        subscription: &WebhookSubscription,
        at: DateTime<Utc>,
    ) -> WebhookResult<CircuitState> {
        self.store.record_success(&subscription.id, at).await?;
        Ok(CircuitState::Closed { failure_count: 0 })
    }

    /// Records a failed delivery, disabling the subscription once the
    /// post-increment count reaches the threshold.
    pub async fn record_failure(
        &self,
        subscription: &WebhookSubscription,
    ) -> WebhookResult<CircuitState> {
        let failure_count = self.store.increment_failure(&subscription.id).await?;
        let state = CircuitState::after_failures(failure_count, self.failure_threshold);

        if state.is_open() {
            self.store.disable(&subscription.id).await?;
            tracing::warn!(
                subscription_id = %subscription.id,
                failure_count,
                "Webhook subscription auto-disabled after {} consecutive failures",
                failure_count
            );
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemorySubscriptionStore;
    use crate::subscription::SubscriptionType;
    use agora_events::EventKind;

    async fn setup(failure_count: u32) -> (Arc<InMemorySubscriptionStore>, WebhookSubscription) {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let mut sub = WebhookSubscription::new(
            "https://example.com/hook",
            "secret",
            [EventKind::PostCreated],
            SubscriptionType::Generic,
        );
        sub.failure_count = failure_count;
        store.save_subscription(&sub).await.unwrap();
        (store, sub)
    }

    #[test]
    fn test_after_failures() {
        assert_eq!(
            CircuitState::after_failures(4, 5),
            CircuitState::Closed { failure_count: 4 }
        );
        assert_eq!(
            CircuitState::after_failures(5, 5),
            CircuitState::Open { failure_count: 5 }
        );
        assert!(CircuitState::after_failures(7, 5).is_open());
    }

    #[tokio::test]
    async fn test_fifth_failure_trips() {
        let (store, sub) = setup(4).await;
        let breaker = CircuitBreaker::new(store.clone(), 5);

        let state = breaker.record_failure(&sub).await.unwrap();
        assert_eq!(state, CircuitState::Open { failure_count: 5 });

        let stored = store.get_subscription(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.failure_count, 5);
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_failure_below_threshold_stays_active() {
        let (store, sub) = setup(2).await;
        let breaker = CircuitBreaker::new(store.clone(), 5);

        let state = breaker.record_failure(&sub).await.unwrap();
        assert_eq!(state, CircuitState::Closed { failure_count: 3 });

        let stored = store.get_subscription(&sub.id).await.unwrap().unwrap();
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn test_success_resets() {
        let (store, sub) = setup(3).await;
        let breaker = CircuitBreaker::new(store.clone(), 5);

        let at = Utc::now();
        breaker.record_success(&sub, at).await.unwrap();

        let stored = store.get_subscription(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.failure_count, 0);
        assert_eq!(stored.last_triggered_at, Some(at));
    }
}
