//! # Repository Layer
//!
//! The engine consumes persistence through the [`ProviderStore`] contract:
//! load one record, save it back under an optimistic version check, and scan
//! for rotation work. Two implementations are provided, a SeaORM-backed
//! repository for the service and an in-memory store for tests and embedded
//! use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::provider::Model;

pub mod memory;
pub mod provider;

pub use memory::MemoryProviderStore;
pub use provider::ProviderRepository;

/// Failures of the persistence contract.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("provider '{code}' not found")]
    NotFound { code: String },
    #[error("provider '{code}' already exists")]
    Duplicate { code: String },
    /// The record changed since it was loaded; nothing was written.
    #[error("stale write for provider '{code}'")]
    Conflict { code: String },
    #[error("storage backend failure")]
    Backend(#[source] anyhow::Error),
}

/// Read/write contract for the provider catalog.
///
/// `save` must be all-or-nothing: it persists the full record with the
/// version incremented if and only if the stored version still matches the
/// one the caller loaded, and otherwise fails with [`StoreError::Conflict`]
/// without applying anything. Status log append order is preserved exactly
/// as submitted.
#[async_trait]
pub trait ProviderStore: Send + Sync {
    async fn load(&self, code: &str) -> Result<Model, StoreError>;

    /// Creates a new provider record. Fails with [`StoreError::Duplicate`]
    /// when the code is already taken.
    async fn insert(&self, provider: Model) -> Result<Model, StoreError>;

    /// Persists an updated record under the optimistic version check and
    /// returns it as stored (version bumped, `updated_at` refreshed).
    async fn save(&self, provider: Model) -> Result<Model, StoreError>;

    async fn list_all(&self) -> Result<Vec<Model>, StoreError>;

    /// Providers whose automatic rotation is enabled and due at `now`.
    async fn list_due_for_rotation(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Model>, StoreError>;
}

/// Whether a provider is due for automatic key rotation at `now`.
///
/// A provider that has rotation enabled but no schedule yet (never rotated)
/// counts as due so the background scan bootstraps its cadence.
pub fn rotation_due(provider: &Model, now: DateTime<Utc>) -> bool {
    if !provider.is_active || !provider.key_rotation.auto_rotate {
        return false;
    }
    match provider.key_rotation.next_scheduled_rotation {
        Some(next) => next <= now,
        None => true,
    }
}
