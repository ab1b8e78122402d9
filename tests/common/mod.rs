//! Shared helpers for the integration suites.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use payments_engine::models::provider::{Model, ProviderName, ProviderType};
use payments_engine::notify::{NotificationDispatcher, ProviderEvent};
use payments_engine::repositories::{MemoryProviderStore, ProviderStore, StoreError};

/// A mobile-money provider with credentials already issued.
pub fn sample_provider(code: &str) -> Model {
    let mut provider = Model::new(ProviderName::MtnMobileMoney, code, ProviderType::MobileMoney);
    provider.api_config.base_url = Some("https://sandbox.momodeveloper.mtn.com".to_string());
    provider.api_config.primary_key = Some("old-primary".to_string());
    provider.api_config.secondary_key = Some("old-secondary".to_string());
    provider
}

/// Dispatcher that records every event it is handed.
#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<ProviderEvent>>,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ProviderEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn notify(&self, event: ProviderEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Store whose saves always fail, for exercising persistence rollbacks.
///
/// Reads delegate to the shared inner store so tests can inspect the state
/// that survived the failed write.
#[derive(Clone)]
pub struct FailingSaveStore {
    pub inner: MemoryProviderStore,
}

impl FailingSaveStore {
    pub fn new(inner: MemoryProviderStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ProviderStore for FailingSaveStore {
    async fn load(&self, code: &str) -> Result<Model, StoreError> {
        self.inner.load(code).await
    }

    async fn insert(&self, provider: Model) -> Result<Model, StoreError> {
        self.inner.insert(provider).await
    }

    async fn save(&self, provider: Model) -> Result<Model, StoreError> {
        Err(StoreError::Backend(anyhow::anyhow!(
            "simulated storage outage while saving '{}'",
            provider.code
        )))
    }

    async fn list_all(&self) -> Result<Vec<Model>, StoreError> {
        self.inner.list_all().await
    }

    async fn list_due_for_rotation(&self, now: DateTime<Utc>) -> Result<Vec<Model>, StoreError> {
        self.inner.list_due_for_rotation(now).await
    }
}

/// Store whose saves block until the test releases a permit, for holding an
/// operation mid-write while another call races it.
#[derive(Clone)]
pub struct GatedSaveStore {
    pub inner: MemoryProviderStore,
    pub gate: Arc<Semaphore>,
}

impl GatedSaveStore {
    /// Starts with zero permits: every save parks until `gate.add_permits`.
    pub fn new(inner: MemoryProviderStore) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
        }
    }
}

#[async_trait]
impl ProviderStore for GatedSaveStore {
    async fn load(&self, code: &str) -> Result<Model, StoreError> {
        self.inner.load(code).await
    }

    async fn insert(&self, provider: Model) -> Result<Model, StoreError> {
        self.inner.insert(provider).await
    }

    async fn save(&self, provider: Model) -> Result<Model, StoreError> {
        let permit = self
            .gate
            .acquire()
            .await
            .expect("gate semaphore closed");
        permit.forget();
        self.inner.save(provider).await
    }

    async fn list_all(&self) -> Result<Vec<Model>, StoreError> {
        self.inner.list_all().await
    }

    async fn list_due_for_rotation(&self, now: DateTime<Utc>) -> Result<Vec<Model>, StoreError> {
        self.inner.list_due_for_rotation(now).await
    }
}
