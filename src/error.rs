//! # Error Handling
//!
//! Engine-level failures for the stateful operations (status recording and
//! key rotation). Expected validation outcomes are not represented here:
//! amount checks return [`crate::limits::LimitViolation`] as an ordinary
//! value, since rejections are a frequent, recoverable result of normal
//! operation. The variants below are the hard failures a caller must handle;
//! retry and backoff policy stays with the caller.

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::repositories::StoreError;

/// Failures of the stateful engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("provider '{code}' not found")]
    ProviderNotFound { code: String },

    /// A second rotation was requested while one was already running for the
    /// same provider. The caller should retry later or treat it as a no-op.
    #[error("a key rotation for provider '{code}' is already in flight")]
    RotationInProgress { code: String },

    /// The store could not durably commit an update. Nothing was applied;
    /// the persisted record still holds the pre-call state.
    #[error("failed to persist provider update")]
    Persistence(#[source] StoreError),

    /// The secure random source failed while minting replacement credentials.
    /// The old credentials remain authoritative.
    #[error("failed to generate replacement credentials")]
    RandomGeneration(#[from] CryptoError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { code } => EngineError::ProviderNotFound { code },
            other => EngineError::Persistence(other),
        }
    }
}
