//! End-to-end tests for subscription administration.

use std::sync::Arc;

use agora_webhooks::InMemorySubscriptionStore;
use agora_webhooks_sdk::{
    EventKind, PostEvent, SubscriptionConfig, SubscriptionType, SubscriptionUpdate, WebhookAdmin,
    WebhookClient, WebhookConfig, WebhookDispatcher, WebhookError,
};
use wiremock::matchers::{header_exists, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup() -> (WebhookAdmin, Arc<WebhookDispatcher>) {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let dispatcher = Arc::new(WebhookDispatcher::new(store, WebhookConfig::default()).unwrap());
    (WebhookAdmin::new(dispatcher.clone()), dispatcher)
}

#[tokio::test]
async fn test_created_secret_verifies_deliveries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_exists("x-webhook-signature"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (admin, dispatcher) = setup();
    let created = admin
        .create(SubscriptionConfig::new(server.uri()).events([EventKind::PostCreated]))
        .await
        .unwrap();

    let event = PostEvent::builder(EventKind::PostCreated, "p1").title("hi").build();
    dispatcher.dispatch(&event).await.unwrap();

    let request = &server.received_requests().await.unwrap()[0];
    let signature = request
        .headers
        .get("x-webhook-signature")
        .unwrap()
        .to_str()
        .unwrap();
    let received = WebhookClient::new(created.secret)
        .verify(signature, &request.body)
        .unwrap();
    assert_eq!(received.post_id().as_deref(), Some("p1"));
}

#[tokio::test]
async fn test_disabled_subscription_comes_back_after_reactivation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (admin, dispatcher) = setup();
    let created = admin
        .create(
            SubscriptionConfig::new(server.uri())
                .subscription_type(SubscriptionType::Slack)
                .all_events()
                .disabled(),
        )
        .await
        .unwrap();
    let id = created.subscription.id;
    let event = PostEvent::builder(EventKind::PostUpdated, "p1").build();

    assert_eq!(dispatcher.dispatch(&event).await.unwrap().matched, 0);

    admin
        .update(
            &id,
            SubscriptionUpdate {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let summary = dispatcher.dispatch(&event).await.unwrap();
    assert_eq!(summary.succeeded, vec![id.clone()]);

    let listed = admin.get(&id).await.unwrap();
    assert!(listed.last_triggered_at.is_some());
}

#[tokio::test]
async fn test_connectivity_does_not_persist() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (admin, _) = setup();
    let report = admin
        .test_connectivity(&server.uri(), SubscriptionType::Discord)
        .await
        .unwrap();
    assert!(report.success);
    assert_eq!(report.status, Some(200));
    assert!(admin.list().await.unwrap().is_empty());

    let body: serde_json::Value =
        serde_json::from_slice(&server.received_requests().await.unwrap()[0].body).unwrap();
    assert!(body["embeds"].is_array());
}

#[tokio::test]
async fn test_connectivity_rejects_invalid_url() {
    let (admin, _) = setup();
    assert!(matches!(
        admin.test_connectivity("nope", SubscriptionType::Generic).await,
        Err(WebhookError::Validation(_))
    ));
}
