//! # Data Models
//!
//! This module contains the SeaORM entity for the providers table together
//! with the typed policy objects stored in its JSONB columns.

pub mod provider;
pub mod status;

pub use provider::{
    ApiConfig, Availability, Environment, FeeSchedule, KeyRotationPolicy, MaintenanceWindow,
    ProviderName, ProviderType, TransactionLimits, ValidationError,
};
pub use status::{ProviderStatus, StatusEvent, StatusLog};
