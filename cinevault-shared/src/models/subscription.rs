/// Append-only subscription ledger
///
/// One record is written per subscription lifecycle event (purchase,
/// cancellation). Records are never mutated after creation; the profile's
/// subscription fields are a cached projection of the most recent record and
/// may briefly lead the ledger, never the reverse.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subscription_records (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     account_id UUID NOT NULL,
///     status TEXT NOT NULL,
///     plan_type TEXT NOT NULL,
///     start_date TIMESTAMPTZ NOT NULL,
///     end_date TIMESTAMPTZ NOT NULL,
///     payment_method VARCHAR(64),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX idx_subscription_records_account
///     ON subscription_records (account_id, created_at DESC);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::PlanType;

/// Lifecycle state recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Subscription purchased or renewed
    Active,

    /// Subscription cancelled by the account
    Cancelled,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Cancelled => "cancelled",
        }
    }
}

/// One ledger entry for a subscription lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubscriptionRecord {
    /// Unique record ID
    pub id: Uuid,

    /// Account the event belongs to
    pub account_id: Uuid,

    /// Event kind
    pub status: RecordStatus,

    /// Plan in effect for the event
    pub plan_type: PlanType,

    /// Window start
    pub start_date: DateTime<Utc>,

    /// Window end
    pub end_date: DateTime<Utc>,

    /// Payment method reported by the provider, if any
    pub payment_method: Option<String>,

    /// When the record was written
    pub created_at: DateTime<Utc>,
}

/// Input for appending a ledger record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscriptionRecord {
    pub account_id: Uuid,
    pub status: RecordStatus,
    pub plan_type: PlanType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_method: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_status_storage_strings() {
        assert_eq!(RecordStatus::Active.as_str(), "active");
        assert_eq!(RecordStatus::Cancelled.as_str(), "cancelled");
    }
}
