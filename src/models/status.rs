//! Operational status events for payment providers.
//!
//! The status log is the source of truth for a provider's availability: the
//! cached `availability.is_available` flag is always a projection of the most
//! recently appended entry. Entries are immutable once appended.

use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operational status of a payment provider.
///
/// Any status may follow any other; recovery does not have to pass through
/// `degraded` before returning to `operational`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Operational,
    Degraded,
    Outage,
    Maintenance,
}

impl ProviderStatus {
    /// Whether the provider counts as unavailable while in this status.
    pub fn is_downtime(self) -> bool {
        matches!(self, ProviderStatus::Outage | ProviderStatus::Maintenance)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderStatus::Operational => "operational",
            ProviderStatus::Degraded => "degraded",
            ProviderStatus::Outage => "outage",
            ProviderStatus::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single append-only status log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub id: Uuid,
    pub status: ProviderStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Expected or observed duration of the incident, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_services: Vec<String>,
}

/// Ordered history of status events for one provider.
///
/// Stored as a JSONB document on the provider row so that a status append and
/// the availability projection always commit together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StatusLog {
    #[serde(default)]
    pub entries: Vec<StatusEvent>,
}

impl StatusLog {
    /// The status reported by the most recent entry, `operational` when the
    /// log is still empty.
    pub fn current_status(&self) -> ProviderStatus {
        self.entries
            .last()
            .map(|event| event.status)
            .unwrap_or(ProviderStatus::Operational)
    }

    pub fn latest(&self) -> Option<&StatusEvent> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
