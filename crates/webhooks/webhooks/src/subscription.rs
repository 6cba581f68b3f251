//! Webhook subscription model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use agora_events::EventKind;

use crate::error::WebhookError;

/// Wire format a subscription receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionType {
    /// Canonical event JSON, HMAC-signed.
    Generic,
    /// Discord embed message, unsigned.
    Discord,
    /// Slack Block Kit message, unsigned.
    Slack,
}

impl SubscriptionType {
    /// Returns the wire name (e.g. `GENERIC`).
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Generic => "GENERIC",
            SubscriptionType::Discord => "DISCORD",
            SubscriptionType::Slack => "SLACK",
        }
    }

    /// Whether deliveries of this type carry signature headers.
    ///
    /// Discord and Slack endpoints authenticate by URL secrecy only and do
    /// not read custom headers, so they are sent unsigned. Pending product
    /// review.
    pub fn is_signed(&self) -> bool {
        matches!(self, SubscriptionType::Generic)
    }
}

impl Default for SubscriptionType {
    fn default() -> Self {
        SubscriptionType::Generic
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionType {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENERIC" => Ok(SubscriptionType::Generic),
            "DISCORD" => Ok(SubscriptionType::Discord),
            "SLACK" => Ok(SubscriptionType::Slack),
            other => Err(WebhookError::Validation(format!(
                "unknown subscription type: {other}"
            ))),
        }
    }
}

/// A registered webhook endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSubscription {
    /// Unique identifier.
    pub id: String,
    /// Target URL.
    pub url: String,
    /// HMAC key; shown to the creator once and never logged.
    pub secret: String,
    /// Subscribed event kinds.
    pub events: HashSet<EventKind>,
    /// Payload format.
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    /// Whether deliveries are attempted.
    pub is_active: bool,
    /// Consecutive failures since the last success.
    pub failure_count: u32,
    /// Time of the last successful delivery.
    pub last_triggered_at: Option<DateTime<Utc>>,
    /// Free-form note from the administrator.
    pub description: Option<String>,
    /// When the subscription was created.
    pub created_at: DateTime<Utc>,
    /// When the subscription was last changed.
    pub updated_at: DateTime<Utc>,
}

impl WebhookSubscription {
    /// Creates an active subscription with a zeroed failure counter.
    pub fn new(
        url: impl Into<String>,
        secret: impl Into<String>,
        events: impl IntoIterator<Item = EventKind>,
        subscription_type: SubscriptionType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
            secret: secret.into(),
            events: events.into_iter().collect(),
            subscription_type,
            is_active: true,
            failure_count: 0,
            last_triggered_at: None,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Deactivates the subscription.
    pub fn disabled(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Checks if this subscription should receive an event.
    pub fn should_receive(&self, kind: EventKind) -> bool {
        self.is_active && self.events.contains(&kind)
    }

    /// Records a successful delivery.
    pub fn mark_success(&mut self, at: DateTime<Utc>) {
        self.failure_count = 0;
        self.last_triggered_at = Some(at);
        self.updated_at = at;
    }

    /// Records a failed delivery and returns the new failure count.
    pub fn mark_failure(&mut self) -> u32 {
        self.failure_count = self.failure_count.saturating_add(1);
        self.updated_at = Utc::now();
        self.failure_count
    }
}

/// Changes to the administrator-owned fields of a subscription.
///
/// A patch carries no delivery counters, so applying one cannot undo a
/// failure count or auto-disable recorded since the subscription was read.
/// The one exception: re-activating a disabled subscription resets its
/// failure counter.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionPatch {
    /// New target URL.
    pub url: Option<String>,
    /// New event set.
    pub events: Option<HashSet<EventKind>>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
}

impl SubscriptionPatch {
    /// Applies the patch in place.
    pub fn apply_to(self, subscription: &mut WebhookSubscription) {
        if let Some(url) = self.url {
            subscription.url = url;
        }
        if let Some(events) = self.events {
            subscription.events = events;
        }
        if let Some(is_active) = self.is_active {
            if is_active && !subscription.is_active {
                subscription.failure_count = 0;
            }
            subscription.is_active = is_active;
        }
        if let Some(description) = self.description {
            subscription.description = description;
        }
        subscription.updated_at = Utc::now();
    }
}

impl fmt::Debug for WebhookSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSubscription")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("secret", &"[redacted]")
            .field("events", &self.events)
            .field("subscription_type", &self.subscription_type)
            .field("is_active", &self.is_active)
            .field("failure_count", &self.failure_count)
            .field("last_triggered_at", &self.last_triggered_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_receive_requires_active_and_subscribed() {
        let sub = WebhookSubscription::new(
            "https://example.com/hook",
            "secret",
            [EventKind::PostCreated, EventKind::PostDeleted],
            SubscriptionType::Generic,
        );

        assert!(sub.should_receive(EventKind::PostCreated));
        assert!(sub.should_receive(EventKind::PostDeleted));
        assert!(!sub.should_receive(EventKind::PostUpdated));

        let disabled = sub.clone().disabled();
        assert!(!disabled.should_receive(EventKind::PostCreated));
    }

    #[test]
    fn test_mark_success_resets_counter() {
        let mut sub = WebhookSubscription::new(
            "https://example.com/hook",
            "secret",
            [EventKind::PostCreated],
            SubscriptionType::Slack,
        );
        sub.failure_count = 3;

        let at = Utc::now();
        sub.mark_success(at);
        assert_eq!(sub.failure_count, 0);
        assert_eq!(sub.last_triggered_at, Some(at));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let sub = WebhookSubscription::new(
            "https://example.com/hook",
            "super-secret-value",
            [EventKind::PostCreated],
            SubscriptionType::Generic,
        );

        let debug = format!("{sub:?}");
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn test_type_wire_names() {
        assert_eq!("DISCORD".parse::<SubscriptionType>().unwrap(), SubscriptionType::Discord);
        assert!("TEAMS".parse::<SubscriptionType>().is_err());
        assert!(SubscriptionType::Generic.is_signed());
        assert!(!SubscriptionType::Slack.is_signed());
    }
}
