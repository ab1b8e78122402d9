//! In-memory provider store.
//!
//! Implements the same contract as the SeaORM repository over a shared map,
//! including the optimistic version check. Used by the test suites and by
//! embedders that do not need a durable catalog.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ProviderStore, StoreError, rotation_due};
use crate::models::provider;

/// A thread-safe in-memory store for provider records.
#[derive(Debug, Default, Clone)]
pub struct MemoryProviderStore {
    providers: Arc<RwLock<HashMap<String, provider::Model>>>,
}

impl MemoryProviderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProviderStore for MemoryProviderStore {
    async fn load(&self, code: &str) -> Result<provider::Model, StoreError> {
        let providers = self.providers.read().await;
        providers
            .get(code)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                code: code.to_string(),
            })
    }

    async fn insert(&self, record: provider::Model) -> Result<provider::Model, StoreError> {
        let mut providers = self.providers.write().await;
        if providers.contains_key(&record.code) {
            return Err(StoreError::Duplicate {
                code: record.code.clone(),
            });
        }
        providers.insert(record.code.clone(), record.clone());
        Ok(record)
    }

    async fn save(&self, record: provider::Model) -> Result<provider::Model, StoreError> {
        let mut providers = self.providers.write().await;
        let stored = providers
            .get(&record.code)
            .ok_or_else(|| StoreError::NotFound {
                code: record.code.clone(),
            })?;
        if stored.version != record.version {
            return Err(StoreError::Conflict {
                code: record.code.clone(),
            });
        }

        let mut updated = record;
        updated.version += 1;
        updated.updated_at = Utc::now().into();
        providers.insert(updated.code.clone(), updated.clone());
        Ok(updated)
    }

    async fn list_all(&self) -> Result<Vec<provider::Model>, StoreError> {
        let providers = self.providers.read().await;
        let mut all: Vec<_> = providers.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(all)
    }

    async fn list_due_for_rotation(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<provider::Model>, StoreError> {
        let providers = self.providers.read().await;
        let mut due: Vec<_> = providers
            .values()
            .filter(|p| rotation_due(p, now))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::provider::{Model, ProviderName, ProviderType};

    fn sample() -> Model {
        Model::new(ProviderName::MtnMobileMoney, "MTN", ProviderType::MobileMoney)
    }

    #[tokio::test]
    async fn insert_then_load_round_trips() {
        let store = MemoryProviderStore::new();
        store.insert(sample()).await.unwrap();
        let loaded = store.load("MTN").await.unwrap();
        assert_eq!(loaded.code, "MTN");
        assert!(matches!(
            store.load("AIRTEL").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_codes_are_rejected() {
        let store = MemoryProviderStore::new();
        store.insert(sample()).await.unwrap();
        assert!(matches!(
            store.insert(sample()).await,
            Err(StoreError::Duplicate { .. })
        ));
    }

    #[tokio::test]
    async fn stale_saves_conflict() {
        let store = MemoryProviderStore::new();
        store.insert(sample()).await.unwrap();

        let first = store.load("MTN").await.unwrap();
        let second = store.load("MTN").await.unwrap();

        let saved = store.save(first).await.unwrap();
        assert_eq!(saved.version, 2);

        // The second copy still carries version 1 and must not win.
        assert!(matches!(
            store.save(second).await,
            Err(StoreError::Conflict { .. })
        ));
        assert_eq!(store.load("MTN").await.unwrap().version, 2);
    }
}
