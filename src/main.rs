//! # Payments Engine Main Entry Point
//!
//! Wires the engine together as a long-running service: configuration,
//! telemetry, database pool, migrations, catalog seeding, and the background
//! key rotation scheduler. Shuts down cleanly on ctrl-c.

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use tokio_util::sync::CancellationToken;
use tracing::info;

use payments_engine::config::ConfigLoader;
use payments_engine::locks::ProviderLocks;
use payments_engine::notify::{NotificationDispatcher, WebhookDispatcher};
use payments_engine::repositories::{ProviderRepository, ProviderStore};
use payments_engine::rotation::KeyRotationService;
use payments_engine::{db, seeds, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(ConfigLoader::new().load()?);
    telemetry::init_tracing(&config)?;
    info!(profile = %config.profile, "Loaded configuration");

    let db = Arc::new(db::init_pool(&config).await?);
    Migrator::up(db.as_ref(), None).await?;

    let store: Arc<dyn ProviderStore> = Arc::new(ProviderRepository::new(db.clone()));
    seeds::seed_providers(store.as_ref(), &config.rotation).await?;

    let locks = Arc::new(ProviderLocks::new());
    let dispatcher: Arc<dyn NotificationDispatcher> =
        Arc::new(WebhookDispatcher::new(&config.notify, store.clone()));
    let rotation = KeyRotationService::new(
        config.clone(),
        store.clone(),
        dispatcher.clone(),
        locks.clone(),
    );

    let shutdown = CancellationToken::new();
    let scheduler = {
        let rotation = rotation.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { rotation.run(shutdown).await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    shutdown.cancel();
    scheduler.await??;

    Ok(())
}
