//! # Key Rotation Service
//!
//! Replaces provider API credentials on demand or on a schedule. A rotation
//! mints two fresh secrets, captures the outgoing pair for retirement at the
//! upstream provider, and recomputes the next due date from the provider's
//! rotation frequency. The background loop periodically scans for providers
//! with `auto_rotate` enabled whose schedule has come due.
//!
//! At most one rotation runs per provider at any time: a second request while
//! one is in flight fails with `RotationInProgress` instead of racing the
//! first credential write.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge, histogram};
use rand::Rng;
use tokio::sync::Semaphore;
use tokio::time::{Duration as TokioDuration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::config::AppConfig;
use crate::crypto::generate_api_key;
use crate::error::EngineError;
use crate::locks::ProviderLocks;
use crate::models::provider;
use crate::notify::{NotificationDispatcher, ProviderEvent};
use crate::repositories::ProviderStore;

/// A primary/secondary credential pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

/// Outcome of a completed rotation, returned to the caller so the old
/// credentials can be revoked upstream and the new ones propagated.
#[derive(Debug, Clone)]
pub struct RotationResult {
    pub provider_code: String,
    pub old_keys: KeyPair,
    pub new_keys: KeyPair,
    pub next_rotation: DateTime<Utc>,
}

/// The rotation due after a rotation performed at `last`.
pub fn next_rotation_after(last: DateTime<Utc>, frequency_days: u32) -> DateTime<Utc> {
    last + Duration::days(i64::from(frequency_days))
}

#[derive(Debug, Default)]
struct TickStats {
    providers_due: u64,
    rotations_succeeded: u64,
    rotations_skipped: u64,
    rotations_failed: u64,
}

/// Credential rotation service with a background scheduling loop.
pub struct KeyRotationService {
    config: Arc<AppConfig>,
    store: Arc<dyn ProviderStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    locks: Arc<ProviderLocks>,
    /// Codes with a rotation currently in flight.
    in_flight: Arc<StdMutex<HashSet<String>>>,
}

impl KeyRotationService {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn ProviderStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        locks: Arc<ProviderLocks>,
    ) -> Self {
        Self {
            config,
            store,
            dispatcher,
            locks,
            in_flight: Arc::new(StdMutex::new(HashSet::new())),
        }
    }

    /// Rotates the provider's credentials now.
    ///
    /// Both replacement secrets are generated before anything is mutated and
    /// the whole record is saved in one write, so any failure (random source
    /// or persistence) leaves the stored record untouched with the old keys
    /// still authoritative.
    #[instrument(skip(self), fields(provider = %code))]
    pub async fn rotate_keys(&self, code: &str) -> Result<RotationResult, EngineError> {
        {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !in_flight.insert(code.to_string()) {
                counter!("key_rotation_rejected_in_flight_total").increment(1);
                return Err(EngineError::RotationInProgress {
                    code: code.to_string(),
                });
            }
        }
        // The in-flight marker must clear on every exit path, including
        // cancellation while awaiting the store.
        let _cleanup = scopeguard::guard(
            (self.in_flight.clone(), code.to_string()),
            |(in_flight, code)| {
                in_flight
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .remove(&code);
            },
        );

        let _guard = self.locks.acquire(code).await;

        let mut provider = self.store.load(code).await?;

        let new_primary = generate_api_key()?;
        let new_secondary = generate_api_key()?;

        let old_keys = KeyPair {
            primary: provider.api_config.primary_key.clone(),
            secondary: provider.api_config.secondary_key.clone(),
        };

        let now = Utc::now();
        let next_rotation = next_rotation_after(now, provider.key_rotation.rotation_frequency_days);

        provider.api_config.primary_key = Some(new_primary.clone());
        provider.api_config.secondary_key = Some(new_secondary.clone());
        provider.key_rotation.last_rotation = Some(now);
        provider.key_rotation.next_scheduled_rotation = Some(next_rotation);

        let saved = self.store.save(provider).await?;
        // The new credentials are durable; release the provider lock before
        // the dispatcher runs its delivery attempts. The in-flight marker
        // stays until this call returns.
        drop(_guard);

        counter!("key_rotation_success_total", "provider" => saved.code.clone()).increment(1);
        info!(
            provider = %saved.code,
            next_rotation = %next_rotation,
            "rotated provider credentials"
        );

        self.dispatcher
            .notify(ProviderEvent::RotationCompleted {
                provider_code: saved.code.clone(),
                next_rotation,
            })
            .await;

        Ok(RotationResult {
            provider_code: saved.code,
            old_keys,
            new_keys: KeyPair {
                primary: Some(new_primary),
                secondary: Some(new_secondary),
            },
            next_rotation,
        })
    }

    /// Run the rotation loop until the provided shutdown token fires.
    #[instrument(skip_all)]
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), EngineError> {
        info!("Starting key rotation scheduler");
        let tick_interval = TokioDuration::from_secs(self.config.rotation.tick_seconds);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Key rotation scheduler shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    if let Err(err) = self.tick().await {
                        error!(error = ?err, "Key rotation tick failed");
                    }
                    let elapsed = tick_started.elapsed();
                    histogram!("key_rotation_tick_duration_ms")
                        .record(elapsed.as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Key rotation scheduler stopped");
        Ok(())
    }

    /// Execute one scan over the providers due for automatic rotation.
    #[instrument(skip_all)]
    pub async fn tick(&self) -> Result<(), EngineError> {
        let now = Utc::now();
        let mut stats = TickStats::default();

        let due = self.store.list_due_for_rotation(now).await?;
        stats.providers_due = due.len() as u64;

        info!(due = due.len(), "Providers due for key rotation");

        let semaphore = Arc::new(Semaphore::new(self.config.rotation.concurrency as usize));
        let mut handles = Vec::new();

        for provider in due {
            let semaphore = semaphore.clone();
            let service = self.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("rotation semaphore closed");
                service.rotate_with_jitter(&provider).await
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(Ok(())) => stats.rotations_succeeded += 1,
                Ok(Err(EngineError::RotationInProgress { code })) => {
                    stats.rotations_skipped += 1;
                    debug!(provider = %code, "Rotation already in flight, skipping");
                }
                Ok(Err(err)) => {
                    stats.rotations_failed += 1;
                    error!(error = ?err, "Scheduled rotation failed");
                }
                Err(err) => {
                    stats.rotations_failed += 1;
                    error!(error = ?err, "Rotation task panicked or was cancelled");
                }
            }
        }

        gauge!("key_rotation_due_gauge").set(stats.providers_due as f64);
        counter!("key_rotation_scheduled_success_total").increment(stats.rotations_succeeded);
        counter!("key_rotation_scheduled_failure_total").increment(stats.rotations_failed);

        debug!(
            providers_due = stats.providers_due,
            rotations_succeeded = stats.rotations_succeeded,
            rotations_skipped = stats.rotations_skipped,
            rotations_failed = stats.rotations_failed,
            "Key rotation tick completed"
        );

        Ok(())
    }

    /// Rotate one provider after a short random delay.
    async fn rotate_with_jitter(&self, provider: &provider::Model) -> Result<(), EngineError> {
        let jitter_seconds = self.compute_jitter();
        if jitter_seconds > 0 {
            debug!(
                provider = %provider.code,
                jitter_seconds,
                "Applying jitter before rotation"
            );
            sleep(TokioDuration::from_secs(jitter_seconds)).await;
        }

        self.rotate_keys(&provider.code).await.map(|_| ())
    }

    fn compute_jitter(&self) -> u64 {
        if self.config.rotation.jitter_factor <= 0.0 {
            return 0;
        }

        let max_delay_seconds =
            (self.config.rotation.tick_seconds as f64 * self.config.rotation.jitter_factor) as u64;

        let mut rng = rand::thread_rng();
        rng.gen_range(0..=max_delay_seconds)
    }
}

impl Clone for KeyRotationService {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: self.store.clone(),
            dispatcher: self.dispatcher.clone(),
            locks: self.locks.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}
