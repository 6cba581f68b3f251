//! HMAC signature generation and verification.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the request body.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Header carrying the event kind.
pub const EVENT_HEADER: &str = "X-Webhook-Event";

/// Signs webhook payloads with a subscription secret.
pub struct WebhookSigner {
    secret: String,
}

impl WebhookSigner {
    /// Creates a new signer with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Returns the hex HMAC-SHA256 of `payload`.
    pub fn sign(&self, payload: &[u8]) -> String {
        hex::encode(self.mac(payload))
    }

    /// Verifies a hex signature against the payload in constant time.
    pub fn verify(&self, signature: &str, payload: &[u8]) -> bool {
        let Ok(presented) = hex::decode(signature.trim()) else {
            return false;
        };
        let expected = self.mac(payload);
        expected.as_slice().ct_eq(presented.as_slice()).into()
    }

    fn mac(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Returns the hex HMAC-SHA256 of `payload` keyed with `secret`.
pub fn sign_payload(payload: &[u8], secret: &str) -> String {
    WebhookSigner::new(secret).sign(payload)
}

/// Checks a presented hex signature against `payload` and `secret`.
///
/// The comparison runs in constant time over the MAC bytes. Malformed hex
/// or a wrong length is a mismatch.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    WebhookSigner::new(secret).verify(signature, payload)
}

/// Generates a random 32-byte hex signing secret.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}
