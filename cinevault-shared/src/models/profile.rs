/// Application-owned user state: role and subscription projection
///
/// A profile is keyed by the identity-store account id and carries everything
/// the identity store does not own: the role, the cached subscription
/// projection, and creator approval state. It is created implicitly on first
/// successful registration and upserted by account id so that a retried
/// registration never produces duplicates.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     account_id UUID PRIMARY KEY,
///     role TEXT NOT NULL DEFAULT 'user',
///     subscription_status TEXT NOT NULL DEFAULT 'inactive',
///     subscription_start TIMESTAMPTZ,
///     subscription_end TIMESTAMPTZ,
///     subscription_plan TEXT,
///     creator_status TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access-control role for an account
///
/// Transitions are one-way in practice: `user` becomes `subscriber` on
/// payment, or `creator` after manual approval. `admin` exists only for the
/// single allow-listed operations account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Registered viewer without an active subscription
    User,

    /// Paying viewer with premium catalog access
    Subscriber,

    /// Approved content creator with upload access
    Creator,

    /// Operations account (single allow-listed email)
    Admin,
}

impl Role {
    /// Converts role to string for display and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Subscriber => "subscriber",
            Role::Creator => "creator",
            Role::Admin => "admin",
        }
    }

    /// Parses a role from its storage string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "subscriber" => Some(Role::Subscriber),
            "creator" => Some(Role::Creator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Can publish and manage catalog content
    pub fn can_manage_content(&self) -> bool {
        matches!(self, Role::Creator | Role::Admin)
    }

    /// Can approve pending creator accounts
    pub fn can_approve_creators(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Roles that must never be downgraded by a subscription purchase
    ///
    /// A creator or admin who subscribes keeps their role; only plain users
    /// are promoted to `subscriber`.
    pub fn outranks_subscriber(&self) -> bool {
        matches!(self, Role::Creator | Role::Admin)
    }
}

/// Subscription state cached on the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Paid and within the subscription window
    Active,

    /// No subscription, or a cancelled/expired one
    Inactive,

    /// Trial period access
    Trial,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Trial => "trial",
        }
    }
}

/// Billing plan for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    /// Renews every calendar month
    Monthly,

    /// Renews every calendar year
    Yearly,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Monthly => "monthly",
            PlanType::Yearly => "yearly",
        }
    }

    /// Length of one billing period, in calendar months
    pub fn period_months(&self) -> u32 {
        match self {
            PlanType::Monthly => 1,
            PlanType::Yearly => 12,
        }
    }
}

/// Approval state for creator accounts
///
/// Creators register like everyone else but cannot log in as `creator`
/// until an admin approves the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CreatorStatus {
    /// Application submitted, awaiting review
    Pending,

    /// Approved by an admin
    Approved,

    /// Rejected by an admin
    Rejected,
}

/// Application user record, keyed by the identity-store account id
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Owning account (identity store id)
    pub account_id: Uuid,

    /// Access-control role
    pub role: Role,

    /// Cached subscription state (projection of the most recent ledger record)
    pub subscription_status: SubscriptionStatus,

    /// Start of the current subscription window
    pub subscription_start: Option<DateTime<Utc>>,

    /// End of the current subscription window
    pub subscription_end: Option<DateTime<Utc>>,

    /// Plan of the current subscription
    pub subscription_plan: Option<PlanType>,

    /// Creator approval state (None for non-creator accounts)
    pub creator_status: Option<CreatorStatus>,

    /// When the profile was created
    pub created_at: DateTime<Utc>,

    /// When the profile was last updated
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// True if this profile grants premium catalog access right now
    ///
    /// Active with an unset or future end date, or any trial.
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        match self.subscription_status {
            SubscriptionStatus::Active => match self.subscription_end {
                Some(end) => end > now,
                None => true,
            },
            SubscriptionStatus::Trial => true,
            SubscriptionStatus::Inactive => false,
        }
    }
}

/// Subscription fields written together by the subscription manager
///
/// Grouped so the role/status invariant (`subscriber` implies `active`) has a
/// single write path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub status: SubscriptionStatus,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub plan: Option<PlanType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(status: SubscriptionStatus, end: Option<DateTime<Utc>>) -> Profile {
        Profile {
            account_id: Uuid::new_v4(),
            role: Role::User,
            subscription_status: status,
            subscription_start: None,
            subscription_end: end,
            subscription_plan: None,
            creator_status: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [Role::User, Role::Subscriber, Role::Creator, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_role_outranks_subscriber() {
        assert!(Role::Creator.outranks_subscriber());
        assert!(Role::Admin.outranks_subscriber());
        assert!(!Role::User.outranks_subscriber());
        assert!(!Role::Subscriber.outranks_subscriber());
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Creator.can_manage_content());
        assert!(Role::Admin.can_manage_content());
        assert!(!Role::Subscriber.can_manage_content());

        assert!(Role::Admin.can_approve_creators());
        assert!(!Role::Creator.can_approve_creators());
    }

    #[test]
    fn test_status_storage_strings() {
        assert_eq!(SubscriptionStatus::Active.as_str(), "active");
        assert_eq!(SubscriptionStatus::Inactive.as_str(), "inactive");
        assert_eq!(SubscriptionStatus::Trial.as_str(), "trial");
    }

    #[test]
    fn test_plan_period_months() {
        assert_eq!(PlanType::Monthly.period_months(), 1);
        assert_eq!(PlanType::Yearly.period_months(), 12);
    }

    #[test]
    fn test_active_with_future_end() {
        let now = Utc::now();
        let p = profile(SubscriptionStatus::Active, Some(now + Duration::days(10)));
        assert!(p.has_active_subscription(now));
    }

    #[test]
    fn test_active_with_no_end() {
        let now = Utc::now();
        let p = profile(SubscriptionStatus::Active, None);
        assert!(p.has_active_subscription(now));
    }

    #[test]
    fn test_active_with_past_end() {
        let now = Utc::now();
        let p = profile(SubscriptionStatus::Active, Some(now - Duration::days(1)));
        assert!(!p.has_active_subscription(now));
    }

    #[test]
    fn test_trial_always_counts() {
        let now = Utc::now();
        let p = profile(SubscriptionStatus::Trial, None);
        assert!(p.has_active_subscription(now));
    }

    #[test]
    fn test_inactive_never_counts() {
        let now = Utc::now();
        let p = profile(SubscriptionStatus::Inactive, Some(now + Duration::days(10)));
        assert!(!p.has_active_subscription(now));
    }
}
