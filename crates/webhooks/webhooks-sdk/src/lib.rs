//! # Agora Webhooks SDK
//!
//! Helpers for operating the Agora webhook system.
//!
//! This crate provides:
//! - Validated subscription configuration
//! - Subscription administration (create, list, update, delete, test)
//! - Verification of signed events received from another Agora instance
//!
//! ## Example
//!
//! ```rust,ignore
//! use agora_webhooks_sdk::{SubscriptionConfig, WebhookAdmin};
//!
//! let admin = WebhookAdmin::new(dispatcher);
//! let created = admin
//!     .create(
//!         SubscriptionConfig::new("https://discord.com/api/webhooks/...")
//!             .subscription_type(SubscriptionType::Discord)
//!             .all_events(),
//!     )
//!     .await?;
//!
//! // Hand the secret to the receiver operator now; it is not shown again.
//! println!("{}", created.secret);
//! ```

mod admin;
mod builder;
mod client;

pub use admin::{CreatedSubscription, SubscriptionSummary, SubscriptionUpdate, WebhookAdmin};
pub use builder::SubscriptionConfig;
pub use client::{WebhookClient, WebhookExtractor, verify_webhook};

// Re-export core webhook types for convenience
pub use agora_webhooks::{
    ConnectivityReport, EventKind, PostEvent, SubscriptionType, WebhookConfig, WebhookDispatcher,
    WebhookError, WebhookResult,
};
