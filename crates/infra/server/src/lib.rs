//! # Agora Server
//!
//! HTTP front for the Agora webhook system: subscription administration,
//! signed inbound events and the internal event intake used by the post
//! service.

mod auth;
mod config;
mod error;
pub mod routes;

pub use auth::AdminAuth;
pub use config::{
    AppConfig, CONFIG_PATH_ENV, ConfigError, DEFAULT_CONFIG_PATH, ServerConfig, WebhookSettings,
    load_config, load_config_from_env, parse_config,
};
pub use error::ApiError;

use std::sync::Arc;

use agora_events::EventEmitter;
use agora_webhooks::{InMemorySubscriptionStore, SubscriptionStore, WebhookDispatcher, WebhookError};
use agora_webhooks_sdk::{WebhookAdmin, WebhookClient};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    /// Subscription administration.
    pub admin: WebhookAdmin,
    /// Post event emitter; the webhook dispatcher is registered on it.
    pub emitter: Arc<EventEmitter>,
    /// Verifier for signed inbound events, when a secret is configured.
    pub inbound: Option<Arc<WebhookClient>>,
    /// Admin bearer token, when configured.
    pub admin_secret: Option<Arc<str>>,
}

impl AppState {
    /// Wires the dispatcher, emitter and verifiers over `store`.
    pub async fn new(
        config: &AppConfig,
        store: Arc<dyn SubscriptionStore>,
    ) -> Result<Self, ServerError> {
        config.validate()?;

        let dispatcher = Arc::new(WebhookDispatcher::new(
            store,
            config.webhooks.to_webhook_config(),
        )?);

        let emitter = Arc::new(EventEmitter::new());
        emitter.on(dispatcher.clone()).await;

        Ok(Self {
            admin: WebhookAdmin::new(dispatcher),
            emitter,
            inbound: config
                .webhooks
                .inbound_secret
                .as_deref()
                .map(|secret| Arc::new(WebhookClient::new(secret))),
            admin_secret: config.server.admin_secret.as_deref().map(Arc::from),
        })
    }
}

/// The Agora server.
pub struct AgoraServer {
    /// Application configuration.
    pub config: AppConfig,
    state: AppState,
}

impl AgoraServer {
    /// Creates a server backed by the in-memory subscription store.
    pub async fn new(config: AppConfig) -> Result<Self, ServerError> {
        Self::with_store(config, Arc::new(InMemorySubscriptionStore::new())).await
    }

    /// Creates a server over a custom subscription store.
    pub async fn with_store(
        config: AppConfig,
        store: Arc<dyn SubscriptionStore>,
    ) -> Result<Self, ServerError> {
        let state = AppState::new(&config, store).await?;
        Ok(Self { config, state })
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Builds the router.
    pub fn router(&self) -> axum::Router {
        routes::router(self.state.clone())
    }

    /// Binds and serves until the process is stopped.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.server.bind_addr();

        if self.state.admin_secret.is_none() {
            tracing::warn!("No admin_secret configured, admin API is unauthenticated");
        }
        if self.state.inbound.is_none() {
            tracing::info!("No inbound_secret configured, inbound webhooks are rejected");
        }

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(
            addr = %addr,
            timeout_secs = self.config.webhooks.timeout_secs,
            failure_threshold = self.config.webhooks.failure_threshold,
            "Starting Agora server"
        );

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Startup error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The webhook dispatcher could not be built.
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    /// Binding or serving the listener failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
