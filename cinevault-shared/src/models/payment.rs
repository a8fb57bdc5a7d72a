/// Payment provider notifications
///
/// The payment provider's hosted checkout is an opaque redirect; the only
/// thing CineVault trusts is the signed webhook that follows. Providers
/// retry webhook delivery, so every notification carries a transaction id and
/// processing is keyed on it: the first delivery wins, later duplicates are
/// acknowledged and ignored.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payment_events (
///     transaction_id VARCHAR(128) PRIMARY KEY,
///     account_id UUID NOT NULL,
///     plan_type TEXT NOT NULL,
///     status TEXT NOT NULL,
///     processed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::PlanType;

/// Outcome reported by the payment provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Payment captured; activate the subscription
    Approved,

    /// Payment still settling; no action yet
    Pending,

    /// Payment declined or reversed
    Rejected,
}

/// Webhook payload from the payment provider
///
/// `account_id` is a string on the wire and validated by the subscription
/// manager, since malformed ids are a caller error, not a server fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentNotification {
    /// Provider-assigned transaction id, the idempotency key
    pub transaction_id: String,

    /// Account the payment was made for
    pub account_id: String,

    /// Purchased plan
    pub plan_type: PlanType,

    /// Payment outcome
    pub status: PaymentStatus,

    /// Optional payment method label (e.g. "credit_card")
    pub payment_method: Option<String>,
}

/// Processed-transaction row
///
/// Kept forever; existence of a row is what makes webhook processing
/// idempotent under provider retries.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentEvent {
    pub transaction_id: String,
    pub account_id: uuid::Uuid,
    pub plan_type: PlanType,
    pub status: PaymentStatus,
    pub processed_at: DateTime<Utc>,
}
