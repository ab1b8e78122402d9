//! Webhook delivery of provider events.
//!
//! Posts each event to the provider's configured webhook target when webhooks
//! are enabled for that provider. Payloads are signed with HMAC-SHA256 using
//! the provider's webhook secret so receivers can authenticate the sender.
//! Targets must be HTTPS and at most 2048 characters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{NotificationDispatcher, ProviderEvent};
use crate::config::NotifyConfig;
use crate::repositories::ProviderStore;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded payload signature.
pub const SIGNATURE_HEADER: &str = "x-payments-signature-256";

const MAX_WEBHOOK_URL_LEN: usize = 2048;

/// Dispatcher that delivers events to per-provider webhook targets.
pub struct WebhookDispatcher {
    client: Client,
    store: Arc<dyn ProviderStore>,
    max_retries: u32,
    allow_http: bool,
}

impl WebhookDispatcher {
    pub fn new(config: &NotifyConfig, store: Arc<dyn ProviderStore>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.webhook_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            store,
            max_retries: config.max_retries,
            allow_http: config.webhook_allow_http,
        }
    }

    /// Validate a webhook target before sending anything to it.
    fn validate_webhook_url(&self, webhook_url: &str) -> bool {
        if webhook_url.len() > MAX_WEBHOOK_URL_LEN {
            warn!(
                target_host = %self.redacted_target(webhook_url),
                length = webhook_url.len(),
                "Webhook URL exceeds maximum length"
            );
            return false;
        }

        let lowered = webhook_url.to_lowercase();
        let scheme_ok =
            lowered.starts_with("https://") || (self.allow_http && lowered.starts_with("http://"));
        if !scheme_ok {
            warn!(
                target_host = %self.redacted_target(webhook_url),
                "Rejected webhook URL with disallowed scheme"
            );
        }
        scheme_ok
    }

    fn redacted_target(&self, webhook_url: &str) -> String {
        Url::parse(webhook_url)
            .ok()
            .map(|parsed| {
                let scheme = parsed.scheme();
                let host = parsed.host_str().unwrap_or("unknown");
                format!("{}://{}", scheme, host)
            })
            .unwrap_or_else(|| "[invalid-url]".to_string())
    }

    /// Hex HMAC-SHA256 of the request body under the provider's secret.
    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    async fn deliver(&self, webhook_url: &str, secret: Option<&str>, event: &ProviderEvent) {
        let body = match serde_json::to_vec(event) {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "Failed to serialize provider event");
                return;
            }
        };

        let signature = secret.map(|secret| format!("sha256={}", Self::sign(secret, &body)));

        let mut delay = Duration::from_secs(1);
        for attempt in 1..=self.max_retries {
            let mut request = self
                .client
                .post(webhook_url)
                .header("content-type", "application/json")
                .body(body.clone());
            if let Some(signature) = &signature {
                request = request.header(SIGNATURE_HEADER, signature.as_str());
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    info!(
                        provider = %event.provider_code(),
                        kind = event.kind(),
                        target_host = %self.redacted_target(webhook_url),
                        attempt,
                        "Delivered provider event webhook"
                    );
                    return;
                }
                Ok(response) => {
                    warn!(
                        provider = %event.provider_code(),
                        status = %response.status(),
                        attempt,
                        "Webhook target returned an error status"
                    );
                }
                Err(err) => {
                    warn!(
                        provider = %event.provider_code(),
                        error = %err,
                        attempt,
                        "Failed to reach webhook target"
                    );
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        error!(
            provider = %event.provider_code(),
            kind = event.kind(),
            target_host = %self.redacted_target(webhook_url),
            retries = self.max_retries,
            "Giving up on webhook delivery"
        );
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    async fn notify(&self, event: ProviderEvent) {
        let provider = match self.store.load(event.provider_code()).await {
            Ok(provider) => provider,
            Err(err) => {
                warn!(
                    provider = %event.provider_code(),
                    error = %err,
                    "Dropping event for unknown provider"
                );
                return;
            }
        };

        if !provider.api_config.webhook_enabled {
            debug!(provider = %provider.code, "Webhooks disabled, dropping event");
            return;
        }
        let Some(webhook_url) = provider.api_config.webhook_url.clone() else {
            debug!(provider = %provider.code, "No webhook target configured, dropping event");
            return;
        };
        if !self.validate_webhook_url(&webhook_url) {
            return;
        }

        self.deliver(
            &webhook_url,
            provider.api_config.webhook_secret.as_deref(),
            &event,
        )
        .await;
    }
}
