/// The merged session view of an authenticated user
///
/// `SessionUser` is the one shape clients see: the account's public fields
/// joined with the profile's role and subscription projection. It is built in
/// exactly one place ([`SessionUser::merge`]) so the field-by-field remapping
/// that used to be scattered across call sites cannot drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::account::Account;
use crate::models::profile::{
    CreatorStatus, PlanType, Profile, Role, SubscriptionStatus,
};

/// Client-facing view of an authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    /// Account ID (identity store)
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Short handle
    pub username: String,

    /// Full display name
    pub display_name: String,

    /// Optional bio
    pub bio: Option<String>,

    /// Access-control role
    pub role: Role,

    /// Subscription state
    pub subscription_status: SubscriptionStatus,

    /// Current subscription window start
    pub subscription_start: Option<DateTime<Utc>>,

    /// Current subscription window end
    pub subscription_end: Option<DateTime<Utc>>,

    /// Current plan
    pub subscription_plan: Option<PlanType>,

    /// Creator approval state, if a creator application exists
    pub creator_status: Option<CreatorStatus>,

    /// Convenience flag: `active` or `trial`
    ///
    /// Derived at construction from `subscription_status` alone; never
    /// persisted, never set independently.
    pub is_subscriber: bool,
}

impl SessionUser {
    /// Builds the merged view from the two store records
    pub fn merge(account: &Account, profile: &Profile) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            bio: account.bio.clone(),
            role: profile.role,
            subscription_status: profile.subscription_status,
            subscription_start: profile.subscription_start,
            subscription_end: profile.subscription_end,
            subscription_plan: profile.subscription_plan,
            creator_status: profile.creator_status,
            is_subscriber: matches!(
                profile.subscription_status,
                SubscriptionStatus::Active | SubscriptionStatus::Trial
            ),
        }
    }

    /// True if this session grants premium access right now
    ///
    /// Same rule as [`Profile::has_active_subscription`], evaluated against
    /// the session's cached fields.
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

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "viewer@example.com".to_string(),
            username: "viewer".to_string(),
            display_name: "Viewer".to_string(),
            bio: Some("hi".to_string()),
            password_hash: "$argon2id$hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    fn profile(account_id: Uuid, status: SubscriptionStatus) -> Profile {
        Profile {
            account_id,
            role: Role::User,
            subscription_status: status,
            subscription_start: None,
            subscription_end: None,
            subscription_plan: None,
            creator_status: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_subscriber_derivation() {
        let account = account();

        let inactive = SessionUser::merge(&account, &profile(account.id, SubscriptionStatus::Inactive));
        assert!(!inactive.is_subscriber);

        let active = SessionUser::merge(&account, &profile(account.id, SubscriptionStatus::Active));
        assert!(active.is_subscriber);

        let trial = SessionUser::merge(&account, &profile(account.id, SubscriptionStatus::Trial));
        assert!(trial.is_subscriber);
    }

    #[test]
    fn test_merge_carries_account_fields() {
        let account = account();
        let merged = SessionUser::merge(&account, &profile(account.id, SubscriptionStatus::Inactive));

        assert_eq!(merged.id, account.id);
        assert_eq!(merged.email, "viewer@example.com");
        assert_eq!(merged.display_name, "Viewer");
        assert_eq!(merged.bio.as_deref(), Some("hi"));
    }
}
