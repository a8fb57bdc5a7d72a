/// Subscription manager: purchase, cancellation, payment processing
///
/// All mutating operations for one account are serialized behind a
/// per-account-id async lock, so a double-clicked "subscribe" or two
/// concurrent webhook deliveries cannot interleave their store writes.
/// Webhook processing is additionally idempotent: the provider transaction
/// id is recorded with a conditional insert, and a repeat delivery is
/// acknowledged without touching anything.
///
/// # Write ordering
///
/// Purchase updates the profile projection first and appends the ledger
/// record second. If the append fails the operation reports
/// [`SubscriptionError::LedgerWriteFailed`] and leaves the projection in
/// place; the projection may lead the ledger, but the ledger must never
/// record a subscription the projection doesn't reflect.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Months, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::payment::{PaymentNotification, PaymentStatus};
use crate::models::profile::{PlanType, Role, SubscriptionState, SubscriptionStatus};
use crate::models::subscription::{NewSubscriptionRecord, RecordStatus};
use crate::store::{AppStore, StoreError};

/// Error type for subscription operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    /// Account id is not a well-formed identifier
    #[error("Invalid account id")]
    InvalidAccountId,

    /// No profile exists for the account
    #[error("No profile for account {0}")]
    ProfileNotFound(Uuid),

    /// Projection updated but the ledger append failed
    ///
    /// The subscription IS active; history will catch up on reconciliation.
    #[error("Subscription activated but the ledger write failed")]
    LedgerWriteFailed,

    /// Store unreachable or timed out; safe to retry
    #[error("Service temporarily unavailable, please try again")]
    ProviderUnavailable,

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for SubscriptionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => SubscriptionError::ProviderUnavailable,
            other => SubscriptionError::Internal(other.to_string()),
        }
    }
}

/// What a webhook delivery amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Fresh approved payment; subscription activated
    Activated,

    /// Transaction id already processed; nothing done
    Duplicate,

    /// Non-approved status recorded; nothing activated
    Ignored,
}

/// Computes one billing period from a start instant
///
/// Uses calendar month arithmetic with end-of-month clamping: Jan 31 plus
/// one month is the last day of February, never a rollover into March.
/// Returns None only on date overflow at the far end of the calendar.
pub fn subscription_period(
    start: DateTime<Utc>,
    plan: PlanType,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let end = start.checked_add_months(Months::new(plan.period_months()))?;
    Some((start, end))
}

/// Serialized, idempotent subscription mutations over the application store
#[derive(Clone)]
pub struct SubscriptionManager {
    app: Arc<dyn AppStore>,
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
    timeout: Duration,
}

impl SubscriptionManager {
    pub fn new(app: Arc<dyn AppStore>, timeout: Duration) -> Self {
        Self {
            app,
            locks: Arc::new(Mutex::new(HashMap::new())),
            timeout,
        }
    }

    /// Returns the lock guarding all mutations for one account
    async fn account_lock(&self, account_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, SubscriptionError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(SubscriptionError::from),
            Err(_) => Err(SubscriptionError::ProviderUnavailable),
        }
    }

    /// Activates a subscription for an account
    ///
    /// The account id arrives as a string from external callers and is
    /// validated here. Roles that outrank `subscriber` (creator, admin) are
    /// never downgraded by a purchase.
    pub async fn create_subscription(
        &self,
        account_id: &str,
        plan: PlanType,
        payment_method: Option<String>,
    ) -> Result<(), SubscriptionError> {
        let account_id =
            Uuid::parse_str(account_id).map_err(|_| SubscriptionError::InvalidAccountId)?;

        let lock = self.account_lock(account_id).await;
        let _guard = lock.lock().await;

        self.activate_locked(account_id, plan, payment_method).await
    }

    /// Purchase body; caller holds the per-account lock
    async fn activate_locked(
        &self,
        account_id: Uuid,
        plan: PlanType,
        payment_method: Option<String>,
    ) -> Result<(), SubscriptionError> {
        let profile = self
            .bounded(self.app.find_profile(account_id))
            .await?
            .ok_or(SubscriptionError::ProfileNotFound(account_id))?;

        let (start, end) = subscription_period(Utc::now(), plan)
            .ok_or_else(|| SubscriptionError::Internal("date overflow".to_string()))?;

        let role = if profile.role.outranks_subscriber() {
            None
        } else {
            Some(Role::Subscriber)
        };

        let updated = self
            .bounded(self.app.update_subscription(
                account_id,
                SubscriptionState {
                    status: SubscriptionStatus::Active,
                    start: Some(start),
                    end: Some(end),
                    plan: Some(plan),
                },
                role,
            ))
            .await?;
        if !updated {
            return Err(SubscriptionError::ProfileNotFound(account_id));
        }

        let append = self
            .bounded(self.app.append_record(NewSubscriptionRecord {
                account_id,
                status: RecordStatus::Active,
                plan_type: plan,
                start_date: start,
                end_date: end,
                payment_method,
            }))
            .await;

        if let Err(err) = append {
            tracing::error!(
                account_id = %account_id,
                error = %err,
                "ledger append failed after projection update"
            );
            return Err(SubscriptionError::LedgerWriteFailed);
        }

        tracing::info!(account_id = %account_id, plan = plan.as_str(), "subscription activated");
        Ok(())
    }

    /// Cancels the current subscription
    ///
    /// Sets the projection inactive and appends a `cancelled` record; the
    /// prior `active` record stays as written, so history reads as the
    /// sequence of lifecycle events.
    pub async fn cancel_subscription(&self, account_id: Uuid) -> Result<(), SubscriptionError> {
        let lock = self.account_lock(account_id).await;
        let _guard = lock.lock().await;

        let profile = self
            .bounded(self.app.find_profile(account_id))
            .await?
            .ok_or(SubscriptionError::ProfileNotFound(account_id))?;

        let now = Utc::now();

        self.bounded(self.app.update_subscription(
            account_id,
            SubscriptionState {
                status: SubscriptionStatus::Inactive,
                start: profile.subscription_start,
                end: profile.subscription_end,
                plan: profile.subscription_plan,
            },
            None,
        ))
        .await?;

        // Nothing to record if there was never a plan to cancel
        if let Some(plan) = profile.subscription_plan {
            self.bounded(self.app.append_record(NewSubscriptionRecord {
                account_id,
                status: RecordStatus::Cancelled,
                plan_type: plan,
                start_date: profile.subscription_start.unwrap_or(now),
                end_date: now,
                payment_method: None,
            }))
            .await
            .map_err(|err| {
                tracing::error!(account_id = %account_id, error = %err, "cancel ledger append failed");
                SubscriptionError::LedgerWriteFailed
            })?;
        }

        tracing::info!(account_id = %account_id, "subscription cancelled");
        Ok(())
    }

    /// Ledger history for an account, newest first
    pub async fn history(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<crate::models::subscription::SubscriptionRecord>, SubscriptionError> {
        self.bounded(self.app.list_records(account_id)).await
    }

    /// Processes a payment provider notification
    ///
    /// Idempotent under provider retries: the transaction id is claimed with
    /// a conditional insert before any other work, so a repeat delivery
    /// (concurrent or later) is a no-op.
    pub async fn process_payment(
        &self,
        notification: &PaymentNotification,
    ) -> Result<PaymentOutcome, SubscriptionError> {
        let account_id = Uuid::parse_str(&notification.account_id)
            .map_err(|_| SubscriptionError::InvalidAccountId)?;

        let lock = self.account_lock(account_id).await;
        let _guard = lock.lock().await;

        let fresh = self
            .bounded(self.app.record_transaction(notification, account_id))
            .await?;
        if !fresh {
            tracing::info!(
                transaction_id = %notification.transaction_id,
                "duplicate payment notification ignored"
            );
            return Ok(PaymentOutcome::Duplicate);
        }

        if notification.status != PaymentStatus::Approved {
            tracing::info!(
                transaction_id = %notification.transaction_id,
                status = ?notification.status,
                "non-approved payment recorded"
            );
            return Ok(PaymentOutcome::Ignored);
        }

        self.activate_locked(
            account_id,
            notification.plan_type,
            notification.payment_method.clone(),
        )
        .await?;

        Ok(PaymentOutcome::Activated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::CreatorStatus;
    use crate::store::memory::MemoryAppStore;
    use chrono::TimeZone;

    fn manager() -> (SubscriptionManager, Arc<MemoryAppStore>) {
        let app = Arc::new(MemoryAppStore::new());
        let manager = SubscriptionManager::new(app.clone(), Duration::from_secs(5));
        (manager, app)
    }

    fn notification(txn: &str, account_id: Uuid, status: PaymentStatus) -> PaymentNotification {
        PaymentNotification {
            transaction_id: txn.to_string(),
            account_id: account_id.to_string(),
            plan_type: PlanType::Monthly,
            status,
            payment_method: Some("credit_card".to_string()),
        }
    }

    #[test]
    fn test_period_monthly_clamps_end_of_month() {
        let start = Utc.with_ymd_and_hms(2023, 1, 31, 12, 0, 0).unwrap();
        let (_, end) = subscription_period(start, PlanType::Monthly).unwrap();
        // Jan 31 + 1 month clamps to Feb 28, not Mar 2/3
        assert_eq!(end, Utc.with_ymd_and_hms(2023, 2, 28, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_period_monthly_leap_year() {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let (_, end) = subscription_period(start, PlanType::Monthly).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_period_yearly() {
        let start = Utc.with_ymd_and_hms(2023, 6, 15, 8, 30, 0).unwrap();
        let (_, end) = subscription_period(start, PlanType::Yearly).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 6, 15, 8, 30, 0).unwrap());
    }

    #[tokio::test]
    async fn test_create_subscription_activates_profile() {
        let (manager, app) = manager();
        let id = Uuid::new_v4();
        app.upsert_profile(id, Role::User, None).await.unwrap();

        manager
            .create_subscription(&id.to_string(), PlanType::Monthly, None)
            .await
            .unwrap();

        let profile = app.find_profile(id).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
        assert_eq!(profile.role, Role::Subscriber);
        assert_eq!(profile.subscription_plan, Some(PlanType::Monthly));
        assert!(profile.has_active_subscription(Utc::now()));

        let records = app.list_records(id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Active);
    }

    #[tokio::test]
    async fn test_create_subscription_does_not_downgrade_creator() {
        let (manager, app) = manager();
        let id = Uuid::new_v4();
        app.upsert_profile(id, Role::Creator, Some(CreatorStatus::Approved))
            .await
            .unwrap();

        manager
            .create_subscription(&id.to_string(), PlanType::Yearly, None)
            .await
            .unwrap();

        let profile = app.find_profile(id).await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Creator);
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_invalid_account_id_rejected() {
        let (manager, _) = manager();
        let err = manager
            .create_subscription("definitely-not-a-uuid", PlanType::Monthly, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidAccountId));
    }

    #[tokio::test]
    async fn test_cancel_appends_record_and_deactivates() {
        let (manager, app) = manager();
        let id = Uuid::new_v4();
        app.upsert_profile(id, Role::User, None).await.unwrap();

        manager
            .create_subscription(&id.to_string(), PlanType::Monthly, None)
            .await
            .unwrap();
        manager.cancel_subscription(id).await.unwrap();

        let profile = app.find_profile(id).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Inactive);
        assert!(!profile.has_active_subscription(Utc::now()));

        // History shows both lifecycle events, newest first
        let records = app.list_records(id).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, RecordStatus::Cancelled);
        assert_eq!(records[1].status, RecordStatus::Active);
    }

    #[tokio::test]
    async fn test_ledger_failure_leaves_projection_active() {
        let (manager, app) = manager();
        let id = Uuid::new_v4();
        app.upsert_profile(id, Role::User, None).await.unwrap();

        app.fail_next_append();
        let err = manager
            .create_subscription(&id.to_string(), PlanType::Monthly, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::LedgerWriteFailed));

        // Projection leads the ledger, never the reverse
        let profile = app.find_profile(id).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
        assert!(app.list_records(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_duplicate_delivery_is_noop() {
        let (manager, app) = manager();
        let id = Uuid::new_v4();
        app.upsert_profile(id, Role::User, None).await.unwrap();

        let n = notification("txn-42", id, PaymentStatus::Approved);
        assert_eq!(manager.process_payment(&n).await.unwrap(), PaymentOutcome::Activated);
        assert_eq!(manager.process_payment(&n).await.unwrap(), PaymentOutcome::Duplicate);

        // Exactly one active record despite two deliveries
        let records = app.list_records(id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Active);
    }

    #[tokio::test]
    async fn test_webhook_non_approved_is_recorded_but_inert() {
        let (manager, app) = manager();
        let id = Uuid::new_v4();
        app.upsert_profile(id, Role::User, None).await.unwrap();

        let n = notification("txn-43", id, PaymentStatus::Pending);
        assert_eq!(manager.process_payment(&n).await.unwrap(), PaymentOutcome::Ignored);

        let profile = app.find_profile(id).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Inactive);
        assert!(app.list_records(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_double_click_serializes() {
        let (manager, app) = manager();
        let id = Uuid::new_v4();
        app.upsert_profile(id, Role::User, None).await.unwrap();

        // Same transaction id delivered twice concurrently: the lock plus
        // the conditional insert guarantee one activation
        let n = notification("txn-44", id, PaymentStatus::Approved);
        let (a, b) = tokio::join!(manager.process_payment(&n), manager.process_payment(&n));

        let outcomes = [a.unwrap(), b.unwrap()];
        assert!(outcomes.contains(&PaymentOutcome::Activated));
        assert!(outcomes.contains(&PaymentOutcome::Duplicate));
        assert_eq!(app.list_records(id).await.unwrap().len(), 1);
    }
}
