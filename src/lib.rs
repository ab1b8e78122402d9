//! # Payment Provider Policy & Lifecycle Engine
//!
//! Governs how external payment channels are configured and used: pricing
//! transaction amounts against a provider's fee schedule, validating amounts
//! against its limits, tracking operational availability from an append-only
//! status log, and rotating API credentials on a schedule.
//!
//! The fee calculator and limit validator are pure functions over the
//! provider record. The availability tracker and key rotation service are the
//! stateful core: they serialize updates per provider and persist through the
//! [`repositories::ProviderStore`] contract.

pub mod availability;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod fees;
pub mod limits;
pub mod locks;
pub mod models;
pub mod notify;
pub mod repositories;
pub mod rotation;
pub mod seeds;
pub mod telemetry;

pub use availability::{AvailabilityTracker, StatusChange};
pub use error::EngineError;
pub use fees::compute_fee;
pub use limits::{LimitViolation, validate_amount};
pub use rotation::{KeyRotationService, RotationResult};
pub use migration;
