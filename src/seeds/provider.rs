//! Provider seeding functionality.
//!
//! Bootstraps the catalog with the known payment channels so a fresh
//! deployment can price and validate transactions immediately. Seeding is
//! idempotent: channels that already exist are left untouched, including any
//! admin edits made after the first boot.

use anyhow::Result;

use crate::config::RotationConfig;
use crate::models::provider::{Model, ProviderName, ProviderType};
use crate::models::{ApiConfig, Environment, FeeSchedule, TransactionLimits};
use crate::repositories::{ProviderStore, StoreError};

/// Seeds the provider catalog with the known payment channels.
pub async fn seed_providers(store: &dyn ProviderStore, rotation: &RotationConfig) -> Result<()> {
    for mut provider in default_catalog() {
        provider.key_rotation.rotation_frequency_days = rotation.default_frequency_days;

        match store.load(&provider.code).await {
            Ok(_) => {
                log::info!("Provider '{}' already exists, skipping", provider.code);
                continue;
            }
            Err(StoreError::NotFound { .. }) => {
                log::info!("Creating provider: {}", provider.code);
                provider.validate()?;
                match store.insert(provider.clone()).await {
                    Ok(_) => log::info!("Successfully created provider: {}", provider.code),
                    // Lost the race against a concurrent boot; the row exists.
                    Err(StoreError::Duplicate { .. }) => {
                        log::info!("Provider '{}' created concurrently", provider.code)
                    }
                    Err(e) => {
                        log::error!("Failed to create provider '{}': {}", provider.code, e);
                        return Err(e.into());
                    }
                }
            }
            Err(e) => {
                log::error!("Error checking if provider '{}' exists: {}", provider.code, e);
                return Err(e.into());
            }
        }
    }

    log::info!("Provider seeding completed successfully");
    Ok(())
}

/// The closed set of channels the platform knows how to move money through.
pub fn default_catalog() -> Vec<Model> {
    vec![
        mobile_money_channel(
            ProviderName::MtnMobileMoney,
            "MTN",
            "https://sandbox.momodeveloper.mtn.com",
            FeeSchedule {
                fixed_fee: Some(0),
                percentage_fee: Some(1.5),
                minimum_fee: Some(100),
                maximum_fee: Some(0),
            },
            TransactionLimits {
                min_amount: Some(500),
                max_amount: Some(5_000_000),
                daily_limit: Some(10_000_000),
                monthly_limit: None,
                per_transaction_limit: Some(5_000_000),
            },
        ),
        mobile_money_channel(
            ProviderName::AirtelMoney,
            "AIRTEL",
            "https://openapiuat.airtel.africa",
            FeeSchedule {
                fixed_fee: Some(0),
                percentage_fee: Some(2.0),
                minimum_fee: Some(100),
                maximum_fee: Some(0),
            },
            TransactionLimits {
                min_amount: Some(500),
                max_amount: Some(2_000_000),
                daily_limit: Some(5_000_000),
                monthly_limit: None,
                per_transaction_limit: Some(2_000_000),
            },
        ),
        mobile_money_channel(
            ProviderName::Mpesa,
            "MPESA",
            "https://sandbox.safaricom.co.ke",
            FeeSchedule {
                fixed_fee: Some(0),
                percentage_fee: Some(1.0),
                minimum_fee: Some(50),
                maximum_fee: Some(0),
            },
            TransactionLimits {
                min_amount: Some(100),
                max_amount: Some(2_000_000),
                daily_limit: Some(6_000_000),
                monthly_limit: None,
                per_transaction_limit: Some(2_000_000),
            },
        ),
        {
            let mut provider = Model::new(
                ProviderName::Flutterwave,
                "FLUTTERWAVE",
                ProviderType::Aggregator,
            );
            provider.api_config = ApiConfig {
                base_url: Some("https://api.flutterwave.com".to_string()),
                api_version: Some("v3".to_string()),
                environment: Environment::Sandbox,
                timeout_seconds: Some(30),
                ..Default::default()
            };
            provider.fees = FeeSchedule {
                fixed_fee: Some(0),
                percentage_fee: Some(1.4),
                minimum_fee: Some(0),
                maximum_fee: Some(200_000),
            };
            provider.limits = TransactionLimits {
                min_amount: Some(100),
                max_amount: Some(10_000_000),
                daily_limit: None,
                monthly_limit: None,
                per_transaction_limit: Some(10_000_000),
            };
            provider.key_rotation.auto_rotate = true;
            provider
        },
        {
            let mut provider =
                Model::new(ProviderName::BankTransfer, "BANK", ProviderType::Bank);
            provider.fees = FeeSchedule {
                fixed_fee: Some(2_500),
                percentage_fee: Some(0.0),
                minimum_fee: Some(0),
                maximum_fee: Some(0),
            };
            provider.limits = TransactionLimits {
                min_amount: Some(10_000),
                max_amount: None,
                daily_limit: None,
                monthly_limit: None,
                per_transaction_limit: None,
            };
            provider
        },
        // Cash has no upstream API and nothing to rotate.
        Model::new(ProviderName::CashCollection, "CASH", ProviderType::Manual),
    ]
}

fn mobile_money_channel(
    name: ProviderName,
    code: &str,
    base_url: &str,
    fees: FeeSchedule,
    limits: TransactionLimits,
) -> Model {
    let mut provider = Model::new(name, code, ProviderType::MobileMoney);
    provider.api_config = ApiConfig {
        base_url: Some(base_url.to_string()),
        api_version: Some("v1".to_string()),
        environment: Environment::Sandbox,
        timeout_seconds: Some(30),
        ..Default::default()
    };
    provider.fees = fees;
    provider.limits = limits;
    provider.key_rotation.auto_rotate = true;
    provider
}
