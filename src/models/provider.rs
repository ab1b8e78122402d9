//! Provider entity model.
//!
//! One record per configured payment channel (mobile money operator,
//! aggregator, bank or manual channel). Identity fields are plain columns;
//! the policy objects governing fees, limits, availability and credential
//! rotation are typed JSONB documents so that a read-modify-write cycle
//! always persists the whole record atomically under the `version` check.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::ActiveModelBehavior;
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::status::StatusLog;

/// Closed set of payment channels known to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ProviderName {
    #[sea_orm(string_value = "MTN Mobile Money")]
    #[serde(rename = "MTN Mobile Money")]
    MtnMobileMoney,
    #[sea_orm(string_value = "Airtel Money")]
    #[serde(rename = "Airtel Money")]
    AirtelMoney,
    #[sea_orm(string_value = "M-Pesa")]
    #[serde(rename = "M-Pesa")]
    Mpesa,
    #[sea_orm(string_value = "Flutterwave")]
    #[serde(rename = "Flutterwave")]
    Flutterwave,
    #[sea_orm(string_value = "Bank Transfer")]
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    #[sea_orm(string_value = "Cash Collection")]
    #[serde(rename = "Cash Collection")]
    CashCollection,
    #[sea_orm(string_value = "Other")]
    #[serde(rename = "Other")]
    Other,
}

/// Kind of integration behind a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "kebab-case")]
pub enum ProviderType {
    #[sea_orm(string_value = "mobile-money")]
    MobileMoney,
    #[sea_orm(string_value = "aggregator")]
    Aggregator,
    #[sea_orm(string_value = "bank")]
    Bank,
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Upstream environment the credentials are issued for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
    Test,
}

/// Connection parameters for a provider's upstream API.
///
/// The primary and secondary keys are the mutable target of key rotation;
/// everything else only changes through explicit admin edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub api_version: Option<String>,
    pub primary_key: Option<String>,
    pub secondary_key: Option<String>,
    pub environment: Environment,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub webhook_enabled: bool,
    pub extra_headers: BTreeMap<String, String>,
    pub timeout_seconds: Option<u64>,
}

/// Fee schedule for pricing transactions through a channel.
///
/// All amounts are whole currency units. An absent field means zero for the
/// fee components and unbounded for the clamps; a clamp set to zero is also
/// treated as unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct FeeSchedule {
    pub fixed_fee: Option<i64>,
    pub percentage_fee: Option<f64>,
    pub minimum_fee: Option<i64>,
    pub maximum_fee: Option<i64>,
}

impl FeeSchedule {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fixed_fee.is_some_and(|v| v < 0) {
            return Err(ValidationError::NegativeFee { field: "fixed_fee" });
        }
        if self.percentage_fee.is_some_and(|v| v < 0.0) {
            return Err(ValidationError::NegativeFee {
                field: "percentage_fee",
            });
        }
        if self.minimum_fee.is_some_and(|v| v < 0) {
            return Err(ValidationError::NegativeFee {
                field: "minimum_fee",
            });
        }
        if self.maximum_fee.is_some_and(|v| v < 0) {
            return Err(ValidationError::NegativeFee {
                field: "maximum_fee",
            });
        }
        if let (Some(minimum), Some(maximum)) = (self.minimum_fee, self.maximum_fee)
            && minimum > 0
            && maximum > 0
            && minimum > maximum
        {
            return Err(ValidationError::FeeBoundsInverted { minimum, maximum });
        }
        Ok(())
    }
}

/// Transaction amount bounds for a channel.
///
/// `daily_limit` and `monthly_limit` are carried for reporting but are not
/// enforced by the validator; enforcement would need a transaction ledger
/// this engine does not own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct TransactionLimits {
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    pub daily_limit: Option<i64>,
    pub monthly_limit: Option<i64>,
    pub per_transaction_limit: Option<i64>,
}

impl TransactionLimits {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("min_amount", self.min_amount),
            ("max_amount", self.max_amount),
            ("daily_limit", self.daily_limit),
            ("monthly_limit", self.monthly_limit),
            ("per_transaction_limit", self.per_transaction_limit),
        ] {
            if value.is_some_and(|v| v < 0) {
                return Err(ValidationError::NegativeLimit { field });
            }
        }
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount)
            && min > max
        {
            return Err(ValidationError::LimitBoundsInverted { min, max });
        }
        Ok(())
    }
}

/// Planned maintenance window announced ahead of time.
///
/// Purely informational: a window ending in the past does not flip the
/// provider back to operational, only an explicit status event does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Cached availability view projected from the status log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct Availability {
    pub is_available: bool,
    pub last_downtime: Option<DateTime<Utc>>,
    pub scheduled_maintenance: Option<MaintenanceWindow>,
    /// Informational uptime percentage maintained by reporting jobs.
    pub uptime_pct: f64,
}

impl Default for Availability {
    fn default() -> Self {
        Self {
            is_available: true,
            last_downtime: None,
            scheduled_maintenance: None,
            uptime_pct: 100.0,
        }
    }
}

/// Credential rotation schedule for a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct KeyRotationPolicy {
    pub last_rotation: Option<DateTime<Utc>>,
    pub next_scheduled_rotation: Option<DateTime<Utc>>,
    pub rotation_frequency_days: u32,
    pub auto_rotate: bool,
}

impl Default for KeyRotationPolicy {
    fn default() -> Self {
        Self {
            last_rotation: None,
            next_scheduled_rotation: None,
            rotation_frequency_days: DEFAULT_ROTATION_FREQUENCY_DAYS,
            auto_rotate: false,
        }
    }
}

impl KeyRotationPolicy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rotation_frequency_days == 0 {
            return Err(ValidationError::ZeroRotationFrequency);
        }
        Ok(())
    }
}

/// Default rotation cadence when a provider does not override it.
pub const DEFAULT_ROTATION_FREQUENCY_DAYS: u32 = 90;

/// Provider entity representing one configured payment channel.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "providers")]
pub struct Model {
    /// Unique channel code, always stored uppercase and trimmed (primary key).
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,

    pub name: ProviderName,

    pub provider_type: ProviderType,

    /// Whether the channel may be used at all, independent of live status.
    pub is_active: bool,

    #[sea_orm(column_type = "JsonBinary")]
    pub api_config: ApiConfig,

    #[sea_orm(column_type = "JsonBinary")]
    pub fees: FeeSchedule,

    #[sea_orm(column_type = "JsonBinary")]
    pub limits: TransactionLimits,

    #[sea_orm(column_type = "JsonBinary")]
    pub availability: Availability,

    /// Append-only status history; source of truth for `availability`.
    #[sea_orm(column_type = "JsonBinary")]
    pub status_log: StatusLog,

    #[sea_orm(column_type = "JsonBinary")]
    pub key_rotation: KeyRotationPolicy,

    /// Settlement account details, carried through unchanged.
    #[sea_orm(column_type = "JsonBinary")]
    pub account_details: Option<JsonValue>,

    /// Support contacts, carried through unchanged.
    #[sea_orm(column_type = "JsonBinary")]
    pub contact_info: Option<JsonValue>,

    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Option<JsonValue>,

    /// Optimistic concurrency token, incremented on every successful save.
    pub version: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Builds a new provider record with default policies.
    ///
    /// The status log starts empty (projected status `operational`), the
    /// channel is active, and rotation is manual until enabled.
    pub fn new(name: ProviderName, code: &str, provider_type: ProviderType) -> Self {
        let now: DateTimeWithTimeZone = Utc::now().into();
        Self {
            code: normalize_code(code),
            name,
            provider_type,
            is_active: true,
            api_config: ApiConfig::default(),
            fees: FeeSchedule::default(),
            limits: TransactionLimits::default(),
            availability: Availability::default(),
            status_log: StatusLog::default(),
            key_rotation: KeyRotationPolicy::default(),
            account_details: None,
            contact_info: None,
            metadata: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates the construction-time invariants of the record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        if self.code != normalize_code(&self.code) {
            return Err(ValidationError::CodeNotNormalized {
                code: self.code.clone(),
            });
        }
        self.fees.validate()?;
        self.limits.validate()?;
        self.key_rotation.validate()?;
        Ok(())
    }
}

/// Normalizes a provider code to its canonical stored form.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Violations of the provider record's construction-time invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("provider code must not be empty")]
    EmptyCode,
    #[error("provider code '{code}' must be uppercase and trimmed")]
    CodeNotNormalized { code: String },
    #[error("fee '{field}' must be non-negative")]
    NegativeFee { field: &'static str },
    #[error("minimum fee {minimum} exceeds maximum fee {maximum}")]
    FeeBoundsInverted { minimum: i64, maximum: i64 },
    #[error("limit '{field}' must be non-negative")]
    NegativeLimit { field: &'static str },
    #[error("minimum amount {min} exceeds maximum amount {max}")]
    LimitBoundsInverted { min: i64, max: i64 },
    #[error("rotation frequency must be at least one day")]
    ZeroRotationFrequency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_uppercased_and_trimmed() {
        assert_eq!(normalize_code("  mtn "), "MTN");
        let provider = Model::new(ProviderName::MtnMobileMoney, " mtn ", ProviderType::MobileMoney);
        assert_eq!(provider.code, "MTN");
    }

    #[test]
    fn denormalized_codes_fail_validation() {
        let mut provider = Model::new(ProviderName::MtnMobileMoney, "MTN", ProviderType::MobileMoney);
        provider.code = "mtn".to_string();
        assert!(matches!(
            provider.validate(),
            Err(ValidationError::CodeNotNormalized { .. })
        ));
    }

    #[test]
    fn new_provider_defaults() {
        let provider = Model::new(ProviderName::Mpesa, "MPESA", ProviderType::MobileMoney);
        assert!(provider.is_active);
        assert!(provider.availability.is_available);
        assert!(provider.status_log.is_empty());
        assert_eq!(provider.key_rotation.rotation_frequency_days, 90);
        assert!(!provider.key_rotation.auto_rotate);
        assert_eq!(provider.version, 1);
        provider.validate().expect("defaults are valid");
    }

    #[test]
    fn rejects_inverted_fee_bounds() {
        let fees = FeeSchedule {
            minimum_fee: Some(5_000),
            maximum_fee: Some(1_000),
            ..Default::default()
        };
        assert_eq!(
            fees.validate(),
            Err(ValidationError::FeeBoundsInverted {
                minimum: 5_000,
                maximum: 1_000
            })
        );

        // A zero clamp means unbounded and never conflicts.
        let fees = FeeSchedule {
            minimum_fee: Some(5_000),
            maximum_fee: Some(0),
            ..Default::default()
        };
        assert!(fees.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_amount_bounds() {
        let limits = TransactionLimits {
            min_amount: Some(10_000),
            max_amount: Some(500),
            ..Default::default()
        };
        assert_eq!(
            limits.validate(),
            Err(ValidationError::LimitBoundsInverted {
                min: 10_000,
                max: 500
            })
        );
    }

    #[test]
    fn rejects_negative_values() {
        let fees = FeeSchedule {
            fixed_fee: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            fees.validate(),
            Err(ValidationError::NegativeFee { field: "fixed_fee" })
        ));

        let limits = TransactionLimits {
            per_transaction_limit: Some(-5),
            ..Default::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(ValidationError::NegativeLimit {
                field: "per_transaction_limit"
            })
        ));
    }
}
