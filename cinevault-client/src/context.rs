/// The session context: one source of truth for the authenticated user
///
/// Owns the in-memory session state, the durable cache, and the request
/// sequencing that keeps slow responses from clobbering newer state. All
/// reads of "who is logged in" go through here; nothing else touches the
/// cache files.
///
/// # Lifecycle
///
/// - [`SessionContext::init`]; restore from the durable cache, then refresh
///   against the server; a 401 clears everything
/// - login/logout; mutate state and cache together
/// - [`SessionContext::check`]; evaluate an access requirement against the
///   current state via the shared guard
///
/// # Stale responses
///
/// Every state-mutating request takes a ticket from a monotonically
/// increasing sequence. A response only applies if no newer request started
/// while it was in flight; a user who logs out mid-login-response stays
/// logged out.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use cinevault_shared::auth::guard::{self, AccessDecision, Requirement};
use cinevault_shared::auth::session::SessionUser;
use cinevault_shared::models::profile::{PlanType, Role};
use tokio::sync::RwLock;

use crate::api::{ApiClient, ClientError, RegisterInput};
use crate::store::SessionStore;

#[derive(Default)]
struct SessionState {
    user: Option<SessionUser>,
    token: Option<String>,
    loading: bool,
}

/// Client-side session context
pub struct SessionContext {
    client: ApiClient,
    store: SessionStore,
    state: RwLock<SessionState>,
    seq: AtomicU64,
}

impl SessionContext {
    pub fn new(client: ApiClient, store: SessionStore) -> Self {
        Self {
            client,
            store,
            state: RwLock::new(SessionState::default()),
            seq: AtomicU64::new(0),
        }
    }

    /// Takes a ticket for a state-mutating request
    fn begin_request(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True if no newer request started since this ticket was taken
    fn is_current(&self, ticket: u64) -> bool {
        self.seq.load(Ordering::SeqCst) == ticket
    }

    /// Applies a session if the ticket is still current; returns whether it
    /// was applied
    async fn apply_session(&self, ticket: u64, user: SessionUser, token: String) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!("discarding stale session response");
            return false;
        }

        if let Err(err) = self.store.save(&user, &token) {
            tracing::warn!(error = %err, "failed to persist session cache");
        }

        let mut state = self.state.write().await;
        state.user = Some(user);
        state.token = Some(token);
        true
    }

    /// Drops the session from memory and cache together
    async fn clear_session(&self) {
        self.store.clear();
        let mut state = self.state.write().await;
        state.user = None;
        state.token = None;
    }

    /// Restores the session at startup
    ///
    /// The cached session is applied immediately so the UI renders without a
    /// round trip, then refreshed against the server. A 401 means the
    /// session is dead: everything is cleared. Transient failures keep the
    /// cached session; better stale than logged out on a flaky connection.
    pub async fn init(&self) {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            if let Some((user, token)) = self.store.load() {
                state.user = Some(user);
                state.token = Some(token);
            }
        }

        let token = self.state.read().await.token.clone();
        if let Some(token) = token {
            let ticket = self.begin_request();
            match self.client.me(&token).await {
                Ok(user) => {
                    self.apply_session(ticket, user, token).await;
                }
                Err(ClientError::Unauthorized) => {
                    self.clear_session().await;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "session refresh failed; keeping cached session");
                }
            }
        }

        self.state.write().await.loading = false;
    }

    /// Logs in and applies the session unless superseded
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<SessionUser, ClientError> {
        let ticket = self.begin_request();
        let (user, token) = self.client.login(email, password, role).await?;

        self.apply_session(ticket, user.clone(), token).await;
        Ok(user)
    }

    /// Registers and, for non-creator accounts, logs straight in
    pub async fn register(&self, input: RegisterInput) -> Result<SessionUser, ClientError> {
        let email = input.email.clone();
        let password = input.password.clone();
        let creator = input.creator_application;

        let user = self.client.register(&input).await?;

        // Pending creators cannot log in yet; everyone else gets a session
        if !creator {
            return self.login(&email, &password, None).await;
        }
        Ok(user)
    }

    /// Logs out: local state and cache are cleared unconditionally, then the
    /// remote session is revoked best-effort
    pub async fn logout(&self) {
        // Supersede any in-flight response before dropping state
        self.begin_request();

        let token = self.state.read().await.token.clone();
        self.clear_session().await;

        if let Some(token) = token {
            self.client.logout(&token).await;
        }
    }

    /// Re-fetches the session view; a 401 clears the session
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let Some(token) = self.state.read().await.token.clone() else {
            return Ok(());
        };

        let ticket = self.begin_request();
        match self.client.me(&token).await {
            Ok(user) => {
                self.apply_session(ticket, user, token).await;
                Ok(())
            }
            Err(ClientError::Unauthorized) => {
                self.clear_session().await;
                Err(ClientError::Unauthorized)
            }
            Err(err) => Err(err),
        }
    }

    /// Purchases a subscription, then refreshes so the guard sees it
    pub async fn subscribe(&self, plan: PlanType) -> Result<(), ClientError> {
        let Some(token) = self.state.read().await.token.clone() else {
            return Err(ClientError::Unauthorized);
        };

        self.client.subscribe(&token, plan).await?;
        self.refresh().await
    }

    /// Cancels the subscription, then refreshes
    pub async fn cancel_subscription(&self) -> Result<(), ClientError> {
        let Some(token) = self.state.read().await.token.clone() else {
            return Err(ClientError::Unauthorized);
        };

        self.client.cancel_subscription(&token).await?;
        self.refresh().await
    }

    /// Current session user, if any
    pub async fn user(&self) -> Option<SessionUser> {
        self.state.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.user.is_some()
    }

    /// Evaluates an access requirement against the current session state
    pub async fn check(&self, requirement: &Requirement) -> AccessDecision {
        let state = self.state.read().await;
        guard::evaluate(state.user.as_ref(), state.loading, requirement, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinevault_shared::auth::guard::DenyReason;
    use cinevault_shared::models::profile::SubscriptionStatus;
    use uuid::Uuid;

    fn context() -> SessionContext {
        let dir = std::env::temp_dir().join(format!("cinevault-ctx-{}", Uuid::new_v4()));
        let store = SessionStore::open(dir).unwrap();
        // Points nowhere; these tests never hit the network
        let client = ApiClient::new("http://127.0.0.1:1");
        SessionContext::new(client, store)
    }

    fn user(role: Role, status: SubscriptionStatus) -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "viewer@example.com".to_string(),
            username: "viewer".to_string(),
            display_name: "Viewer".to_string(),
            bio: None,
            role,
            subscription_status: status,
            subscription_start: None,
            subscription_end: None,
            subscription_plan: None,
            creator_status: None,
            is_subscriber: matches!(
                status,
                SubscriptionStatus::Active | SubscriptionStatus::Trial
            ),
        }
    }

    #[tokio::test]
    async fn test_apply_session_persists_and_sets_state() {
        let ctx = context();
        let ticket = ctx.begin_request();

        let applied = ctx
            .apply_session(ticket, user(Role::User, SubscriptionStatus::Inactive), "tok".into())
            .await;
        assert!(applied);
        assert!(ctx.is_authenticated().await);
        assert!(ctx.store.load().is_some());
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let ctx = context();

        // A slow login response...
        let slow_ticket = ctx.begin_request();
        // ...superseded by a newer request (say, the user logged out)
        ctx.begin_request();

        let applied = ctx
            .apply_session(
                slow_ticket,
                user(Role::User, SubscriptionStatus::Active),
                "stale-token".into(),
            )
            .await;

        assert!(!applied);
        assert!(!ctx.is_authenticated().await);
        assert!(ctx.store.load().is_none());
    }

    #[tokio::test]
    async fn test_clear_session_empties_memory_and_cache() {
        let ctx = context();
        let ticket = ctx.begin_request();
        ctx.apply_session(ticket, user(Role::User, SubscriptionStatus::Active), "tok".into())
            .await;

        ctx.clear_session().await;
        assert!(!ctx.is_authenticated().await);
        assert!(ctx.store.load().is_none());
    }

    #[tokio::test]
    async fn test_check_unauthenticated() {
        let ctx = context();
        let decision = ctx.check(&Requirement::authenticated()).await;
        assert_eq!(
            decision,
            AccessDecision::Deny {
                reason: DenyReason::Unauthenticated,
                redirect_to: Some(guard::LOGIN_PATH),
            }
        );
    }

    #[tokio::test]
    async fn test_check_pending_while_loading() {
        let ctx = context();
        ctx.state.write().await.loading = true;

        let decision = ctx.check(&Requirement::authenticated()).await;
        assert_eq!(decision, AccessDecision::Pending);
    }

    #[tokio::test]
    async fn test_check_subscription_gate() {
        let ctx = context();
        let ticket = ctx.begin_request();
        ctx.apply_session(
            ticket,
            user(Role::Subscriber, SubscriptionStatus::Active),
            "tok".into(),
        )
        .await;

        let decision = ctx.check(&Requirement::authenticated().with_subscription()).await;
        assert_eq!(decision, AccessDecision::Allow);
    }

    #[tokio::test]
    async fn test_init_restores_cached_session_when_server_unreachable() {
        let dir = std::env::temp_dir().join(format!("cinevault-ctx-{}", Uuid::new_v4()));
        let store = SessionStore::open(&dir).unwrap();
        store
            .save(&user(Role::User, SubscriptionStatus::Active), "cached-token")
            .unwrap();

        let client = ApiClient::with_timeout("http://127.0.0.1:1", std::time::Duration::from_millis(200));
        let ctx = SessionContext::new(client, store);

        // Refresh fails (nothing listens there), but the cached session survives
        ctx.init().await;
        assert!(ctx.is_authenticated().await);
        assert!(!ctx.state.read().await.loading);
    }
}
