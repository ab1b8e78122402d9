//! Per-provider mutual exclusion.
//!
//! The availability tracker and the rotation service both run a
//! read-modify-write cycle against a single provider row. Updates to the same
//! provider must serialize; different providers update fully in parallel.
//! The registry hands out one async mutex per provider code.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-provider update locks.
#[derive(Debug, Default)]
pub struct ProviderLocks {
    inner: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProviderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, code: &str) -> Arc<Mutex<()>> {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(code.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Waits for the provider's update lock.
    pub async fn acquire(&self, code: &str) -> OwnedMutexGuard<()> {
        self.entry(code).lock_owned().await
    }

    /// Takes the provider's update lock only if it is currently free.
    pub fn try_acquire(&self, code: &str) -> Option<OwnedMutexGuard<()>> {
        self.entry(code).try_lock_owned().ok()
    }
}
