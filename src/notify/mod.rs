//! # Notification Dispatch
//!
//! The engine reports rotation results and status transitions as events and
//! leaves delivery policy to the dispatcher. Dispatch is fire-and-forget:
//! a delivery failure never rolls back the provider state change that
//! produced the event, so the trait is infallible and implementations handle
//! their own errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::models::ProviderStatus;

pub mod webhook;

pub use webhook::WebhookDispatcher;

/// Event emitted after a provider state change has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProviderEvent {
    RotationCompleted {
        provider_code: String,
        next_rotation: DateTime<Utc>,
    },
    StatusChanged {
        provider_code: String,
        old_status: ProviderStatus,
        new_status: ProviderStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ProviderEvent {
    pub fn provider_code(&self) -> &str {
        match self {
            ProviderEvent::RotationCompleted { provider_code, .. }
            | ProviderEvent::StatusChanged { provider_code, .. } => provider_code,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProviderEvent::RotationCompleted { .. } => "rotation_completed",
            ProviderEvent::StatusChanged { .. } => "status_changed",
        }
    }
}

/// Delivery boundary for provider lifecycle events.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, event: ProviderEvent);
}

/// Dispatcher that only records events in the service log.
#[derive(Debug, Default, Clone)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn notify(&self, event: ProviderEvent) {
        info!(
            provider = %event.provider_code(),
            kind = event.kind(),
            "provider event"
        );
    }
}
