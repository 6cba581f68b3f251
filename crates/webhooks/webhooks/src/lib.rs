//! # Agora Webhooks
//!
//! Outbound webhook engine for the Agora forum providing:
//! - Subscription model and pluggable subscription storage
//! - Generic, Discord and Slack payload formats
//! - HMAC-SHA256 signing of Generic deliveries
//! - Concurrent fan-out with per-subscription failure tracking
//! - Automatic disabling of chronically failing subscriptions
//! - Constant-time verification of inbound signed requests
//!
//! ## Example
//!
//! ```rust,ignore
//! use agora_webhooks::{InMemorySubscriptionStore, WebhookConfig, WebhookDispatcher};
//!
//! let store = Arc::new(InMemorySubscriptionStore::new());
//! let dispatcher = Arc::new(WebhookDispatcher::new(store, WebhookConfig::default())?);
//!
//! // Called from the post mutation path; returns immediately.
//! dispatcher.trigger_webhooks(EventKind::PostCreated, data);
//! ```

mod subscription;
mod delivery;
mod signature;
pub mod transform;
mod receiver;
mod storage;
mod error;
mod system;
pub mod circuit_breaker;

pub use subscription::{WebhookSubscription, SubscriptionType, SubscriptionPatch};
pub use delivery::{DeliveryClient, DeliveryReport, PreparedDelivery};
pub use signature::{
    WebhookSigner, sign_payload, verify_signature, generate_secret, SIGNATURE_HEADER, EVENT_HEADER,
};
pub use transform::{transform, content_preview, embed_color, PREVIEW_MAX_CHARS};
pub use receiver::WebhookReceiver;
pub use storage::{SubscriptionStore, InMemorySubscriptionStore};
pub use error::{WebhookError, WebhookResult};
pub use system::{
    WebhookDispatcher, WebhookConfig, DispatchSummary, ConnectivityReport, DEFAULT_TIMEOUT_SECS,
    DEFAULT_FAILURE_THRESHOLD,
};
pub use circuit_breaker::{CircuitBreaker, CircuitState};

pub use agora_events::{EventKind, PostEvent};
