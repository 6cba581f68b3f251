//! Webhook client for receiving webhooks.

use agora_events::PostEvent;
use agora_webhooks::{WebhookError, WebhookReceiver, WebhookResult};

/// Client for receiving and verifying signed Agora events.
pub struct WebhookClient {
    receiver: WebhookReceiver,
}

impl WebhookClient {
    /// Creates a new webhook client.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            receiver: WebhookReceiver::new(secret),
        }
    }

    /// Verifies and parses a webhook.
    pub fn verify(&self, signature: &str, payload: &[u8]) -> WebhookResult<PostEvent> {
        self.receiver.verify(signature, payload)
    }

    /// Verifies a webhook signature only.
    pub fn verify_signature(&self, signature: &str, payload: &[u8]) -> WebhookResult<()> {
        self.receiver.verify_signature(signature, payload)
    }

    /// Returns the inner receiver.
    pub fn receiver(&self) -> &WebhookReceiver {
        &self.receiver
    }
}

/// Access to the parts of an HTTP request needed for verification.
pub trait WebhookExtractor {
    /// Extracts the `X-Webhook-Signature` header value.
    fn signature(&self) -> Option<&str>;

    /// Extracts the raw body bytes.
    fn body(&self) -> &[u8];
}

/// Verifies a request through an extractor. A missing header is treated
/// as an invalid signature.
pub fn verify_webhook<E: WebhookExtractor>(
    client: &WebhookClient,
    extractor: &E,
) -> WebhookResult<PostEvent> {
    let signature = extractor.signature().ok_or(WebhookError::InvalidSignature)?;
    client.verify(signature, extractor.body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_events::EventKind;
    use agora_webhooks::sign_payload;

    struct Request {
        signature: Option<String>,
        body: Vec<u8>,
    }

    impl WebhookExtractor for Request {
        fn signature(&self) -> Option<&str> {
            self.signature.as_deref()
        }

        fn body(&self) -> &[u8] {
            &self.body
        }
    }

    fn signed(secret: &str) -> Request {
        let event = PostEvent::builder(EventKind::PostDeleted, "p9").build();
        let body = serde_json::to_vec(&event).unwrap();
        Request {
            signature: Some(sign_payload(&body, secret)),
            body,
        }
    }

    #[test]
    fn test_verify_webhook() {
        let client = WebhookClient::new("shared");
        let event = verify_webhook(&client, &signed("shared")).unwrap();
        assert_eq!(event.kind, EventKind::PostDeleted);
        assert_eq!(event.post_id().as_deref(), Some("p9"));
    }

    #[test]
    fn test_missing_or_wrong_signature() {
        let client = WebhookClient::new("shared");

        let mut unsigned = signed("shared");
        unsigned.signature = None;
        assert!(matches!(
            verify_webhook(&client, &unsigned),
            Err(WebhookError::InvalidSignature)
        ));

        assert!(matches!(
            verify_webhook(&client, &signed("other")),
            Err(WebhookError::InvalidSignature)
        ));
    }
}
