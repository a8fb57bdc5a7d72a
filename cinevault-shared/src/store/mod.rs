/// Storage boundary for the identity store and the application database
///
/// The two stores are deliberately separate trait objects: the identity store
/// owns credentials and account text, the application store owns role and
/// subscription state. Registration and subscription purchase each write to
/// both, and nothing wraps those writes in one transaction; the auth service
/// and subscription manager carry the ordering/retry contracts instead.
///
/// Keeping the identity store behind a trait is what lets a managed auth
/// provider replace [`postgres::PgIdentityStore`] without touching the auth
/// service. [`memory`] provides in-memory twins of both traits for tests and
/// local development.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::account::{Account, NewAccount, UpdateAccount};
use crate::models::payment::PaymentNotification;
use crate::models::profile::{CreatorStatus, Profile, Role, SubscriptionState};
use crate::models::subscription::{NewSubscriptionRecord, SubscriptionRecord};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Email already registered (unique constraint)
    #[error("email already registered")]
    DuplicateEmail,

    /// Referenced record does not exist
    #[error("record not found")]
    NotFound,

    /// Store unreachable or timed out; safe to retry
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(err.to_string())
            }
            sqlx::Error::Io(e) => StoreError::Unavailable(e.to_string()),
            sqlx::Error::Database(db_err) => {
                // Unique violations on the email column surface as a domain error
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return StoreError::DuplicateEmail;
                    }
                }
                StoreError::Backend(db_err.to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Identity store: credentials and account text
///
/// Modeled on a managed auth provider's surface. Password hashes go in and
/// out opaque; verification happens in the auth service.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Creates an account; fails with `DuplicateEmail` if the email is taken
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Case-insensitive email lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Updates owner-mutable fields; returns the updated account if it exists
    async fn update_account(
        &self,
        id: Uuid,
        update: UpdateAccount,
    ) -> Result<Option<Account>, StoreError>;

    /// Replaces the stored password hash
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError>;

    /// Stamps `last_login_at`; called after successful authentication
    async fn record_login(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Triggers the provider's password-reset delivery for an existing email
    ///
    /// Callers must have verified the account exists; the anti-enumeration
    /// contract lives in the auth service, not here.
    async fn send_password_reset(&self, email: &str) -> Result<(), StoreError>;

    /// Best-effort remote session invalidation on logout
    async fn revoke_sessions(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Application store: role, subscription projection, ledger, payment dedup
#[async_trait]
pub trait AppStore: Send + Sync {
    /// Creates the profile for an account if absent, returning the stored row
    ///
    /// Keyed by account id and idempotent, so retrying the second half of a
    /// partially-failed registration never duplicates or clobbers state.
    async fn upsert_profile(
        &self,
        account_id: Uuid,
        role: Role,
        creator_status: Option<CreatorStatus>,
    ) -> Result<Profile, StoreError>;

    async fn find_profile(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Overwrites the role
    async fn set_role(&self, account_id: Uuid, role: Role) -> Result<bool, StoreError>;

    /// Overwrites creator approval state
    async fn set_creator_status(
        &self,
        account_id: Uuid,
        status: CreatorStatus,
    ) -> Result<bool, StoreError>;

    /// Writes the subscription projection, optionally changing the role in
    /// the same statement
    ///
    /// Role and status travel together here so `role = subscriber` can never
    /// be observed with a non-active status.
    async fn update_subscription(
        &self,
        account_id: Uuid,
        state: SubscriptionState,
        role: Option<Role>,
    ) -> Result<bool, StoreError>;

    /// Appends a ledger record
    async fn append_record(
        &self,
        record: NewSubscriptionRecord,
    ) -> Result<SubscriptionRecord, StoreError>;

    /// Ledger history, newest first
    async fn list_records(&self, account_id: Uuid)
        -> Result<Vec<SubscriptionRecord>, StoreError>;

    /// Records a provider transaction id; returns false if already processed
    ///
    /// The conditional insert is the webhook idempotency key.
    async fn record_transaction(
        &self,
        notification: &PaymentNotification,
        account_id: Uuid,
    ) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        assert_eq!(StoreError::DuplicateEmail.to_string(), "email already registered");
        assert!(StoreError::Unavailable("timeout".into()).to_string().contains("timeout"));
    }
}
