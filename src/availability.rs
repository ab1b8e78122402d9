//! Availability tracker.
//!
//! Maintains each provider's operational status from its append-only status
//! log. Every recorded status is a direct jump; there are no disallowed
//! transitions. The cached `availability` view is recomputed from the newly
//! appended entry and persisted together with it, so the log and the
//! projection cannot drift apart.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::EngineError;
use crate::locks::ProviderLocks;
use crate::models::provider;
use crate::models::{MaintenanceWindow, ProviderStatus, StatusEvent};
use crate::notify::{NotificationDispatcher, ProviderEvent};
use crate::repositories::ProviderStore;

/// A status observation to append to a provider's log.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: ProviderStatus,
    pub message: Option<String>,
    pub duration_minutes: Option<u32>,
    pub affected_services: Vec<String>,
}

impl StatusChange {
    pub fn new(status: ProviderStatus) -> Self {
        Self {
            status,
            message: None,
            duration_minutes: None,
            affected_services: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Tracks operational status per provider.
#[derive(Clone)]
pub struct AvailabilityTracker {
    store: Arc<dyn ProviderStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    locks: Arc<ProviderLocks>,
}

impl AvailabilityTracker {
    pub fn new(
        store: Arc<dyn ProviderStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        locks: Arc<ProviderLocks>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            locks,
        }
    }

    /// Appends a status event and updates the availability projection.
    ///
    /// The read-modify-write cycle holds the provider's update lock, and the
    /// new log entry and projection are persisted in one save: on a
    /// persistence failure the stored record is unchanged and the error
    /// propagates. The change notification goes out only after the save
    /// succeeds and cannot roll it back.
    #[instrument(skip(self, change), fields(provider = %code, status = %change.status))]
    pub async fn record_status(
        &self,
        code: &str,
        change: StatusChange,
    ) -> Result<provider::Model, EngineError> {
        let _guard = self.locks.acquire(code).await;

        let mut provider = self.store.load(code).await?;
        let old_status = provider.status_log.current_status();
        let now = Utc::now();

        provider.status_log.entries.push(StatusEvent {
            id: Uuid::new_v4(),
            status: change.status,
            timestamp: now,
            message: change.message.clone(),
            duration_minutes: change.duration_minutes,
            affected_services: change.affected_services,
        });

        if change.status.is_downtime() {
            provider.availability.is_available = false;
            provider.availability.last_downtime = Some(now);
        } else {
            provider.availability.is_available = true;
        }

        let saved = self.store.save(provider).await?;
        // The update is durable; release the provider lock before the
        // dispatcher runs its delivery attempts.
        drop(_guard);

        counter!("provider_status_events_total", "status" => change.status.as_str())
            .increment(1);
        info!(
            provider = %saved.code,
            old_status = %old_status,
            new_status = %change.status,
            "recorded provider status"
        );

        self.dispatcher
            .notify(ProviderEvent::StatusChanged {
                provider_code: saved.code.clone(),
                old_status,
                new_status: change.status,
                message: change.message,
            })
            .await;

        Ok(saved)
    }

    /// Announces a future maintenance window on the availability view.
    ///
    /// Only informational: the provider stays available until an explicit
    /// `maintenance` status is recorded, and a window ending in the past
    /// never restores `operational` on its own.
    pub async fn schedule_maintenance(
        &self,
        code: &str,
        window: MaintenanceWindow,
    ) -> Result<provider::Model, EngineError> {
        let _guard = self.locks.acquire(code).await;

        let mut provider = self.store.load(code).await?;
        provider.availability.scheduled_maintenance = Some(window);
        Ok(self.store.save(provider).await?)
    }

    /// Toggles whether the channel may be used at all.
    ///
    /// Deactivation is the only form of removal; provider records are never
    /// deleted by this engine.
    pub async fn set_active(
        &self,
        code: &str,
        active: bool,
    ) -> Result<provider::Model, EngineError> {
        let _guard = self.locks.acquire(code).await;

        let mut provider = self.store.load(code).await?;
        if provider.is_active == active {
            return Ok(provider);
        }
        provider.is_active = active;
        let saved = self.store.save(provider).await?;
        info!(provider = %saved.code, active, "toggled provider activation");
        Ok(saved)
    }
}
