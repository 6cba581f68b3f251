//! Webhook receiver for verifying incoming webhooks.

use agora_events::PostEvent;

use crate::error::{WebhookError, WebhookResult};
use crate::signature::WebhookSigner;

/// Verifies requests signed with a shared secret.
///
/// Uses the same HMAC-SHA256 scheme as outbound Generic deliveries, so an
/// Agora instance can accept events from another Agora instance.
pub struct WebhookReceiver {
    signer: WebhookSigner,
}

impl WebhookReceiver {
    /// Creates a new webhook receiver.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            signer: WebhookSigner::new(secret),
        }
    }

    /// Verifies only the signature without parsing.
    pub fn verify_signature(&self, signature: &str, payload: &[u8]) -> WebhookResult<()> {
        if self.signer.verify(signature, payload) {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    /// Verifies a webhook signature and parses the payload.
    pub fn verify(&self, signature: &str, payload: &[u8]) -> WebhookResult<PostEvent> {
        self.verify_signature(signature, payload)?;

        let event: PostEvent = serde_json::from_slice(payload)?;
        event
            .validate()
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        Ok(event)
    }
}
