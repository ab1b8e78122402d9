//! Integration tests for webhook event delivery.

mod common;

use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use payments_engine::config::NotifyConfig;
use payments_engine::models::ProviderStatus;
use payments_engine::notify::{NotificationDispatcher, ProviderEvent, WebhookDispatcher};
use payments_engine::repositories::{MemoryProviderStore, ProviderStore};

use common::sample_provider;

fn test_notify_config() -> NotifyConfig {
    NotifyConfig {
        webhook_timeout_seconds: 5,
        max_retries: 3,
        // The mock server only speaks plain http.
        webhook_allow_http: true,
    }
}

async fn store_with_webhook(uri: &str, secret: Option<&str>) -> MemoryProviderStore {
    let store = MemoryProviderStore::new();
    let mut provider = sample_provider("MTN");
    provider.api_config.webhook_enabled = true;
    provider.api_config.webhook_url = Some(format!("{}/hooks/payments", uri));
    provider.api_config.webhook_secret = secret.map(str::to_string);
    store.insert(provider).await.unwrap();
    store
}

fn status_event() -> ProviderEvent {
    ProviderEvent::StatusChanged {
        provider_code: "MTN".to_string(),
        old_status: ProviderStatus::Operational,
        new_status: ProviderStatus::Outage,
        message: Some("carrier down".to_string()),
    }
}

#[tokio::test]
async fn delivers_signed_payload_to_the_configured_target() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/payments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with_webhook(&server.uri(), Some("s3cret")).await;
    let dispatcher = WebhookDispatcher::new(&test_notify_config(), Arc::new(store));

    dispatcher.notify(status_event()).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["event"], "status_changed");
    assert_eq!(body["provider_code"], "MTN");
    assert_eq!(body["new_status"], "outage");

    // The signature verifies against the provider's webhook secret.
    let signature = request
        .headers
        .get("x-payments-signature-256")
        .expect("signature header present")
        .to_str()
        .unwrap();
    let mut mac = Hmac::<Sha256>::new_from_slice(b"s3cret").unwrap();
    mac.update(&request.body);
    let expected = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
    assert_eq!(signature, expected);
}

#[tokio::test]
async fn retries_until_the_target_accepts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/payments"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks/payments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with_webhook(&server.uri(), None).await;
    let dispatcher = WebhookDispatcher::new(&test_notify_config(), Arc::new(store));

    dispatcher
        .notify(ProviderEvent::RotationCompleted {
            provider_code: "MTN".to_string(),
            next_rotation: Utc::now(),
        })
        .await;

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn disabled_webhooks_drop_events_silently() {
    let server = MockServer::start().await;
    let store = MemoryProviderStore::new();
    let mut provider = sample_provider("MTN");
    provider.api_config.webhook_enabled = false;
    provider.api_config.webhook_url = Some(format!("{}/hooks/payments", server.uri()));
    store.insert(provider).await.unwrap();

    let dispatcher = WebhookDispatcher::new(&test_notify_config(), Arc::new(store));
    dispatcher.notify(status_event()).await;

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn plain_http_targets_are_rejected_by_default() {
    let server = MockServer::start().await;
    let store = store_with_webhook(&server.uri(), None).await;

    let config = NotifyConfig {
        webhook_allow_http: false,
        ..test_notify_config()
    };
    let dispatcher = WebhookDispatcher::new(&config, Arc::new(store));
    dispatcher.notify(status_event()).await;

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn events_for_unknown_providers_are_dropped() {
    let dispatcher = WebhookDispatcher::new(
        &test_notify_config(),
        Arc::new(MemoryProviderStore::new()),
    );
    // Must not panic or hang; there is nowhere to deliver to.
    dispatcher.notify(status_event()).await;
}
