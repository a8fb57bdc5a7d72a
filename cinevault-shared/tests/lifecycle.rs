/// End-to-end subscription lifecycle
///
/// Drives the auth service and subscription manager together through the
/// full journey; register, purchase, cancel; over the in-memory stores,
/// asserting the projection and the ledger at every step.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Months, Utc};
use cinevault_shared::auth::service::{AuthConfig, AuthService, NewRegistration};
use cinevault_shared::models::profile::{PlanType, Role, SubscriptionStatus};
use cinevault_shared::models::subscription::RecordStatus;
use cinevault_shared::store::memory::{MemoryAppStore, MemoryIdentityStore};
use cinevault_shared::store::AppStore;
use cinevault_shared::subscription::SubscriptionManager;

fn setup() -> (AuthService, SubscriptionManager, Arc<MemoryAppStore>) {
    let identity = Arc::new(MemoryIdentityStore::new());
    let app = Arc::new(MemoryAppStore::new());

    let auth = AuthService::new(
        identity,
        app.clone(),
        AuthConfig {
            admin_email: "admin@cinevault.example".to_string(),
            provider_timeout: Duration::from_secs(5),
        },
    );
    let subscriptions = SubscriptionManager::new(app.clone(), Duration::from_secs(5));

    (auth, subscriptions, app)
}

#[tokio::test]
async fn test_register_subscribe_cancel_lifecycle() {
    let (auth, subscriptions, app) = setup();

    // Register: fresh viewer, no subscription
    let user = auth
        .register(NewRegistration {
            email: "viewer@example.com".to_string(),
            password: "Str0ngEnough".to_string(),
            username: "viewer".to_string(),
            display_name: "Viewer".to_string(),
            bio: None,
            creator_application: false,
        })
        .await
        .unwrap();
    assert_eq!(user.role, Role::User);
    assert_eq!(user.subscription_status, SubscriptionStatus::Inactive);
    assert!(!auth.has_active_subscription(user.id).await.unwrap());

    // Purchase a monthly plan
    let before = Utc::now();
    subscriptions
        .create_subscription(&user.id.to_string(), PlanType::Monthly, None)
        .await
        .unwrap();

    let session = auth.current_user(user.id).await.unwrap().unwrap();
    assert_eq!(session.role, Role::Subscriber);
    assert_eq!(session.subscription_status, SubscriptionStatus::Active);
    assert!(session.is_subscriber);
    assert!(auth.has_active_subscription(user.id).await.unwrap());

    // End lands one calendar month out from the start
    let start = session.subscription_start.unwrap();
    let end = session.subscription_end.unwrap();
    assert!(start >= before);
    assert_eq!(end, start.checked_add_months(Months::new(1)).unwrap());

    // Cancel: access revoked, history intact
    subscriptions.cancel_subscription(user.id).await.unwrap();

    let session = auth.current_user(user.id).await.unwrap().unwrap();
    assert_eq!(session.subscription_status, SubscriptionStatus::Inactive);
    assert!(!auth.has_active_subscription(user.id).await.unwrap());

    let records = app.list_records(user.id).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, RecordStatus::Cancelled);
    assert_eq!(records[1].status, RecordStatus::Active);
}

#[tokio::test]
async fn test_subscriber_session_reflects_next_refresh() {
    let (auth, subscriptions, _) = setup();

    let user = auth
        .register(NewRegistration {
            email: "late@example.com".to_string(),
            password: "Str0ngEnough".to_string(),
            username: "late".to_string(),
            display_name: "Late Refresher".to_string(),
            bio: None,
            creator_application: false,
        })
        .await
        .unwrap();

    // A session fetched before the purchase still says inactive...
    let stale = auth.current_user(user.id).await.unwrap().unwrap();
    assert!(!stale.is_subscriber);

    subscriptions
        .create_subscription(&user.id.to_string(), PlanType::Yearly, None)
        .await
        .unwrap();

    // ...and the next refresh observes the mutation
    let fresh = auth.current_user(user.id).await.unwrap().unwrap();
    assert!(fresh.is_subscriber);
    assert_eq!(fresh.subscription_plan, Some(PlanType::Yearly));
}
