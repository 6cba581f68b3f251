//! Subscription configuration builder.

use std::collections::HashSet;

use agora_events::EventKind;
use agora_webhooks::{
    SubscriptionType, WebhookError, WebhookResult, WebhookSubscription, generate_secret,
};

/// Validated input for a new subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    url: String,
    events: HashSet<EventKind>,
    subscription_type: SubscriptionType,
    description: Option<String>,
    secret: Option<String>,
    enabled: bool,
}

impl SubscriptionConfig {
    /// Creates a new subscription configuration.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            events: HashSet::new(),
            subscription_type: SubscriptionType::Generic,
            description: None,
            secret: None,
            enabled: true,
        }
    }

    /// Subscribes to the given event kinds.
    pub fn events(mut self, events: impl IntoIterator<Item = EventKind>) -> Self {
        self.events.extend(events);
        self
    }

    /// Subscribes to every event kind.
    pub fn all_events(mut self) -> Self {
        self.events.extend(EventKind::ALL);
        self
    }

    /// Sets the payload format.
    pub fn subscription_type(mut self, subscription_type: SubscriptionType) -> Self {
        self.subscription_type = subscription_type;
        self
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Uses a caller-provided secret instead of generating one.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Creates the subscription inactive.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Checks the URL and event set.
    pub fn validate(&self) -> WebhookResult<()> {
        validate_url(&self.url)?;
        validate_events(&self.events)
    }

    /// Validates and converts into a stored subscription.
    pub fn into_subscription(self) -> WebhookResult<WebhookSubscription> {
        self.validate()?;

        let secret = self.secret.unwrap_or_else(generate_secret);
        let mut subscription =
            WebhookSubscription::new(self.url, secret, self.events, self.subscription_type);
        subscription.description = self.description;
        subscription.is_active = self.enabled;

        Ok(subscription)
    }
}

/// Requires an absolute http(s) URL.
pub(crate) fn validate_url(raw: &str) -> WebhookResult<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| WebhookError::Validation(format!("invalid webhook url: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(WebhookError::Validation(format!(
            "unsupported url scheme: {other}"
        ))),
    }
}

pub(crate) fn validate_events(events: &HashSet<EventKind>) -> WebhookResult<()> {
    if events.is_empty() {
        return Err(WebhookError::Validation(
            "at least one event must be selected".to_string(),
        ));
    }
    Ok(())
}
