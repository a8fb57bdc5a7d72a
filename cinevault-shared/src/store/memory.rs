/// In-memory store implementations
///
/// Hermetic twins of the Postgres stores, used by service-level tests and by
/// local development without a database. Behavior mirrors the real backends
/// closely enough that the auth service and subscription manager cannot tell
/// the difference: duplicate emails fail the same way, transaction ids
/// deduplicate the same way, and failures can be injected to exercise the
/// partial-write paths.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AppStore, IdentityStore, StoreError};
use crate::models::account::{Account, NewAccount, UpdateAccount};
use crate::models::payment::PaymentNotification;
use crate::models::profile::{
    CreatorStatus, Profile, Role, SubscriptionState, SubscriptionStatus,
};
use crate::models::subscription::{NewSubscriptionRecord, SubscriptionRecord};

/// In-memory identity store
#[derive(Default)]
pub struct MemoryIdentityStore {
    accounts: Mutex<HashMap<Uuid, Account>>,

    /// Emails a password reset was actually triggered for; lets tests verify
    /// the anti-enumeration contract from the outside
    reset_requests: Mutex<Vec<String>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emails that received a real reset request so far
    pub async fn reset_requests(&self) -> Vec<String> {
        self.reset_requests.lock().await.clone()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.lock().await;

        let email = Account::normalize_email(&account.email);
        if accounts.values().any(|a| a.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let created = Account {
            id: Uuid::new_v4(),
            email,
            username: account.username,
            display_name: account.display_name,
            bio: account.bio,
            password_hash: account.password_hash,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let email = Account::normalize_email(email);
        let accounts = self.accounts.lock().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.lock().await.get(&id).cloned())
    }

    async fn update_account(
        &self,
        id: Uuid,
        update: UpdateAccount,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.accounts.lock().await;

        let Some(account) = accounts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(email) = update.email {
            account.email = Account::normalize_email(&email);
        }
        if let Some(display_name) = update.display_name {
            account.display_name = display_name;
        }
        if let Some(bio) = update.bio {
            account.bio = bio;
        }
        account.updated_at = Utc::now();

        Ok(Some(account.clone()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let mut accounts = self.accounts.lock().await;
        match accounts.get_mut(&id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_login(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut accounts = self.accounts.lock().await;
        match accounts.get_mut(&id) {
            Some(account) => {
                account.last_login_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), StoreError> {
        self.reset_requests
            .lock()
            .await
            .push(Account::normalize_email(email));
        Ok(())
    }

    async fn revoke_sessions(&self, _id: Uuid) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory application store with injectable failures
#[derive(Default)]
pub struct MemoryAppStore {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    records: Mutex<Vec<SubscriptionRecord>>,
    transactions: Mutex<HashSet<String>>,

    fail_next_upsert: AtomicBool,
    fail_next_append: AtomicBool,
}

impl MemoryAppStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `upsert_profile` fail, simulating the application
    /// database dying after the identity store already committed
    pub fn fail_next_upsert(&self) {
        self.fail_next_upsert.store(true, Ordering::SeqCst);
    }

    /// Makes the next `append_record` fail, simulating a ledger outage after
    /// the projection was already updated
    pub fn fail_next_append(&self) {
        self.fail_next_append.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AppStore for MemoryAppStore {
    async fn upsert_profile(
        &self,
        account_id: Uuid,
        role: Role,
        creator_status: Option<CreatorStatus>,
    ) -> Result<Profile, StoreError> {
        if self.fail_next_upsert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }

        let mut profiles = self.profiles.lock().await;
        let now = Utc::now();

        let profile = profiles.entry(account_id).or_insert_with(|| Profile {
            account_id,
            role,
            subscription_status: SubscriptionStatus::Inactive,
            subscription_start: None,
            subscription_end: None,
            subscription_plan: None,
            creator_status,
            created_at: now,
            updated_at: now,
        });

        Ok(profile.clone())
    }

    async fn find_profile(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.lock().await.get(&account_id).cloned())
    }

    async fn set_role(&self, account_id: Uuid, role: Role) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.lock().await;
        match profiles.get_mut(&account_id) {
            Some(profile) => {
                profile.role = role;
                profile.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_creator_status(
        &self,
        account_id: Uuid,
        status: CreatorStatus,
    ) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.lock().await;
        match profiles.get_mut(&account_id) {
            Some(profile) => {
                profile.creator_status = Some(status);
                profile.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_subscription(
        &self,
        account_id: Uuid,
        state: SubscriptionState,
        role: Option<Role>,
    ) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.lock().await;
        match profiles.get_mut(&account_id) {
            Some(profile) => {
                profile.subscription_status = state.status;
                profile.subscription_start = state.start;
                profile.subscription_end = state.end;
                profile.subscription_plan = state.plan;
                if let Some(role) = role {
                    profile.role = role;
                }
                profile.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn append_record(
        &self,
        record: NewSubscriptionRecord,
    ) -> Result<SubscriptionRecord, StoreError> {
        if self.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }

        let created = SubscriptionRecord {
            id: Uuid::new_v4(),
            account_id: record.account_id,
            status: record.status,
            plan_type: record.plan_type,
            start_date: record.start_date,
            end_date: record.end_date,
            payment_method: record.payment_method,
            created_at: Utc::now(),
        };

        self.records.lock().await.push(created.clone());
        Ok(created)
    }

    async fn list_records(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<SubscriptionRecord>, StoreError> {
        let records = self.records.lock().await;
        let mut matching: Vec<SubscriptionRecord> = records
            .iter()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn record_transaction(
        &self,
        notification: &PaymentNotification,
        _account_id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut transactions = self.transactions.lock().await;
        Ok(transactions.insert(notification.transaction_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::PaymentStatus;
    use crate::models::profile::PlanType;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            username: "viewer".to_string(),
            display_name: "Viewer".to_string(),
            bio: None,
            password_hash: "$argon2id$hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_case_insensitively() {
        let store = MemoryIdentityStore::new();
        store.create_account(new_account("a@example.com")).await.unwrap();

        let err = store.create_account(new_account("A@Example.Com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_upsert_profile_is_idempotent() {
        let store = MemoryAppStore::new();
        let id = Uuid::new_v4();

        let first = store.upsert_profile(id, Role::User, None).await.unwrap();
        store
            .update_subscription(
                id,
                SubscriptionState {
                    status: SubscriptionStatus::Active,
                    start: Some(Utc::now()),
                    end: None,
                    plan: Some(PlanType::Monthly),
                },
                Some(Role::Subscriber),
            )
            .await
            .unwrap();

        // A retried upsert must not reset the subscription state
        let second = store.upsert_profile(id, Role::User, None).await.unwrap();
        assert_eq!(first.account_id, second.account_id);
        assert_eq!(second.subscription_status, SubscriptionStatus::Active);
        assert_eq!(second.role, Role::Subscriber);
    }

    #[tokio::test]
    async fn test_record_transaction_deduplicates() {
        let store = MemoryAppStore::new();
        let notification = PaymentNotification {
            transaction_id: "txn-1".to_string(),
            account_id: Uuid::new_v4().to_string(),
            plan_type: PlanType::Monthly,
            status: PaymentStatus::Approved,
            payment_method: None,
        };

        assert!(store.record_transaction(&notification, Uuid::new_v4()).await.unwrap());
        assert!(!store.record_transaction(&notification, Uuid::new_v4()).await.unwrap());
    }
}
