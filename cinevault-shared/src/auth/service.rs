/// The auth service: registration, login, logout, password reset
///
/// A stateless façade over the identity store and the application store.
/// Every operation returns a `Result`; nothing panics past this boundary,
/// and every store call runs under a bounded timeout so a dead backend
/// surfaces as [`AuthError::ProviderUnavailable`] instead of a hung caller.
///
/// # The two-store write
///
/// Registration writes to both stores and cannot wrap them in one
/// transaction. The contract: if the profile write fails after the account
/// write succeeded, the caller gets [`AuthError::PartialFailure`] carrying
/// the created account id, and [`AuthService::complete_registration`] retries
/// just the second write, idempotently keyed by that id. Overall success is
/// never reported for a half-applied registration.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;
use validator::ValidateEmail;

use super::password;
use super::session::SessionUser;
use crate::models::account::{Account, NewAccount, UpdateAccount};
use crate::models::profile::{CreatorStatus, Role};
use crate::store::{AppStore, IdentityStore, StoreError};

/// Error type for auth operations
///
/// Unknown-email and wrong-password logins both map to
/// `InvalidCredentials` with one message, so callers cannot enumerate
/// accounts.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Malformed input; the caller can correct and retry
    #[error("{0}")]
    Validation(String),

    /// Bad email or password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Email already registered
    #[error("Email already registered")]
    DuplicateEmail,

    /// Password fails the strength policy
    #[error("{0}")]
    WeakCredential(String),

    /// Account exists but not with the requested role
    #[error("Account does not have the {} role", .0.as_str())]
    RoleMismatch(Role),

    /// Creator application not yet approved
    #[error("Creator account is awaiting approval")]
    CreatorNotApproved,

    /// Identity store committed but the profile write failed
    ///
    /// Carries the created account id so the retry targets the existing
    /// account instead of inserting a duplicate.
    #[error("Registration partially completed for account {account_id}; retry to finish")]
    PartialFailure { account_id: Uuid },

    /// Backend unreachable or timed out; safe to retry
    #[error("Service temporarily unavailable, please try again")]
    ProviderUnavailable,

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::Unavailable(_) => AuthError::ProviderUnavailable,
            StoreError::NotFound => AuthError::Internal("record not found".to_string()),
            StoreError::Backend(msg) => AuthError::Internal(msg),
        }
    }
}

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// The one email permitted to hold the admin role
    pub admin_email: String,

    /// Upper bound for any single store call
    pub provider_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_email: String::new(),
            provider_timeout: Duration::from_secs(10),
        }
    }
}

/// Registration input
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub email: String,
    pub password: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,

    /// True when registering as a creator; the account starts with a
    /// pending application instead of plain viewer access
    pub creator_application: bool,
}

/// Stateless auth façade over the two stores
#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityStore>,
    app: Arc<dyn AppStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        app: Arc<dyn AppStore>,
        config: AuthConfig,
    ) -> Self {
        Self {
            identity,
            app,
            config,
        }
    }

    /// Runs a store call under the configured timeout
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.config.provider_timeout, fut).await {
            Ok(result) => result.map_err(AuthError::from),
            Err(_) => Err(AuthError::ProviderUnavailable),
        }
    }

    /// Registers a new account
    ///
    /// Creates the identity-store account, then the application profile
    /// (`role = user`, `status = inactive`; creators start pending). See the
    /// module docs for the partial-failure contract.
    pub async fn register(&self, reg: NewRegistration) -> Result<SessionUser, AuthError> {
        if !reg.email.validate_email() {
            return Err(AuthError::Validation("Invalid email address".to_string()));
        }
        if reg.username.trim().is_empty() || reg.display_name.trim().is_empty() {
            return Err(AuthError::Validation(
                "Username and display name are required".to_string(),
            ));
        }
        password::validate_password_strength(&reg.password).map_err(AuthError::WeakCredential)?;

        let password_hash = password::hash_password(&reg.password)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let account = self
            .bounded(self.identity.create_account(NewAccount {
                email: reg.email,
                username: reg.username,
                display_name: reg.display_name,
                bio: reg.bio,
                password_hash,
            }))
            .await?;

        let (role, creator_status) = if reg.creator_application {
            (Role::Creator, Some(CreatorStatus::Pending))
        } else {
            (Role::User, None)
        };

        match self
            .bounded(self.app.upsert_profile(account.id, role, creator_status))
            .await
        {
            Ok(profile) => Ok(SessionUser::merge(&account, &profile)),
            Err(err) => {
                tracing::error!(
                    account_id = %account.id,
                    error = %err,
                    "profile write failed after account creation"
                );
                Err(AuthError::PartialFailure {
                    account_id: account.id,
                })
            }
        }
    }

    /// Retries the second half of a partially-failed registration
    ///
    /// Idempotent: the profile upsert is keyed by account id, so calling
    /// this after a success is a no-op that returns the existing state.
    pub async fn complete_registration(
        &self,
        account_id: Uuid,
    ) -> Result<SessionUser, AuthError> {
        let account = self
            .bounded(self.identity.find_by_id(account_id))
            .await?
            .ok_or_else(|| AuthError::Validation("Unknown account".to_string()))?;

        let profile = self
            .bounded(self.app.upsert_profile(account_id, Role::User, None))
            .await?;

        Ok(SessionUser::merge(&account, &profile))
    }

    /// Authenticates an account
    ///
    /// `requested_role`, when given, must match the account's actual role;
    /// admin logins additionally require the allow-listed email, and creator
    /// accounts must be approved before any login succeeds.
    pub async fn login(
        &self,
        email: &str,
        password_input: &str,
        requested_role: Option<Role>,
    ) -> Result<SessionUser, AuthError> {
        let Some(account) = self.bounded(self.identity.find_by_email(email)).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        let valid = password::verify_password(password_input, &account.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let profile = self
            .bounded(self.app.find_profile(account.id))
            .await?
            .ok_or(AuthError::PartialFailure {
                account_id: account.id,
            })?;

        if let Some(requested) = requested_role {
            if profile.role != requested {
                return Err(AuthError::RoleMismatch(requested));
            }
        }

        // Single-tenant restriction: the admin role only works from the one
        // allow-listed email, even if a row somehow carries it.
        if profile.role == Role::Admin
            && account.email != Account::normalize_email(&self.config.admin_email)
        {
            return Err(AuthError::RoleMismatch(Role::Admin));
        }

        if profile.role == Role::Creator
            && profile.creator_status != Some(CreatorStatus::Approved)
        {
            return Err(AuthError::CreatorNotApproved);
        }

        if let Err(err) = self.bounded(self.identity.record_login(account.id)).await {
            // Login stamping is best-effort; authentication already succeeded
            tracing::warn!(account_id = %account.id, error = %err, "failed to record login");
        }

        Ok(SessionUser::merge(&account, &profile))
    }

    /// Logs out an account
    ///
    /// Remote session invalidation is best-effort; the operation never fails
    /// the caller. Clearing the local cache is the client's half of the
    /// contract.
    pub async fn logout(&self, account_id: Uuid) {
        if let Err(err) = self.bounded(self.identity.revoke_sessions(account_id)).await {
            tracing::warn!(account_id = %account_id, error = %err, "remote logout failed");
        }
    }

    /// Requests a password reset email
    ///
    /// Always returns Ok. The provider call happens only when the account
    /// exists; lookup failures are logged and swallowed so the response
    /// shape never leaks whether the email is registered.
    pub async fn request_password_reset(&self, email: &str) {
        match self.bounded(self.identity.find_by_email(email)).await {
            Ok(Some(account)) => {
                if let Err(err) = self
                    .bounded(self.identity.send_password_reset(&account.email))
                    .await
                {
                    tracing::warn!(error = %err, "password reset delivery failed");
                }
            }
            Ok(None) => {
                tracing::debug!("password reset requested for unknown email");
            }
            Err(err) => {
                tracing::warn!(error = %err, "password reset lookup failed");
            }
        }
    }

    /// Sets a new password for an authenticated account
    ///
    /// Same strength policy as registration.
    pub async fn reset_password(
        &self,
        account_id: Uuid,
        new_password: &str,
    ) -> Result<(), AuthError> {
        password::validate_password_strength(new_password).map_err(AuthError::WeakCredential)?;

        let password_hash = password::hash_password(new_password)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let updated = self
            .bounded(self.identity.update_password(account_id, &password_hash))
            .await?;
        if !updated {
            return Err(AuthError::Validation("Unknown account".to_string()));
        }

        Ok(())
    }

    /// Updates the owner-mutable account fields (email, display name, bio)
    ///
    /// Only the owning account reaches this; the route layer binds the id
    /// from the bearer context.
    pub async fn update_account(
        &self,
        account_id: Uuid,
        update: UpdateAccount,
    ) -> Result<SessionUser, AuthError> {
        if let Some(ref email) = update.email {
            if !email.validate_email() {
                return Err(AuthError::Validation("Invalid email address".to_string()));
            }
        }

        let account = self
            .bounded(self.identity.update_account(account_id, update))
            .await?
            .ok_or_else(|| AuthError::Validation("Unknown account".to_string()))?;

        let profile = self
            .bounded(self.app.find_profile(account_id))
            .await?
            .ok_or(AuthError::PartialFailure { account_id })?;

        Ok(SessionUser::merge(&account, &profile))
    }

    /// Approves or rejects a pending creator application
    ///
    /// Admin-only; the route layer enforces the role before calling.
    pub async fn review_creator(
        &self,
        account_id: Uuid,
        approved: bool,
    ) -> Result<(), AuthError> {
        let status = if approved {
            CreatorStatus::Approved
        } else {
            CreatorStatus::Rejected
        };

        let updated = self
            .bounded(self.app.set_creator_status(account_id, status))
            .await?;
        if !updated {
            return Err(AuthError::Validation("Unknown account".to_string()));
        }

        tracing::info!(account_id = %account_id, approved, "creator application reviewed");
        Ok(())
    }

    /// Rebuilds the session view for an authenticated account (GET /me)
    ///
    /// Returns None when either half no longer exists; the API maps that to
    /// 401 so the client clears its cache.
    pub async fn current_user(
        &self,
        account_id: Uuid,
    ) -> Result<Option<SessionUser>, AuthError> {
        let Some(account) = self.bounded(self.identity.find_by_id(account_id)).await? else {
            return Ok(None);
        };
        let Some(profile) = self.bounded(self.app.find_profile(account_id)).await? else {
            return Ok(None);
        };

        Ok(Some(SessionUser::merge(&account, &profile)))
    }

    /// True if the account has premium access right now
    pub async fn has_active_subscription(&self, account_id: Uuid) -> Result<bool, AuthError> {
        let profile = self.bounded(self.app.find_profile(account_id)).await?;
        Ok(profile
            .map(|p| p.has_active_subscription(Utc::now()))
            .unwrap_or(false))
    }

    /// Seeds the allow-listed admin account if it does not exist
    ///
    /// Idempotent; called at API startup.
    pub async fn provision_admin(
        &self,
        password_input: &str,
    ) -> Result<(), AuthError> {
        let email = Account::normalize_email(&self.config.admin_email);

        if self.bounded(self.identity.find_by_email(&email)).await?.is_some() {
            return Ok(());
        }

        let password_hash = password::hash_password(password_input)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let account = self
            .bounded(self.identity.create_account(NewAccount {
                email: email.clone(),
                username: "admin".to_string(),
                display_name: "CineVault Admin".to_string(),
                bio: None,
                password_hash,
            }))
            .await?;

        self.bounded(self.app.upsert_profile(account.id, Role::Admin, None))
            .await?;

        tracing::info!(email = %email, "admin account provisioned");
        Ok(())
    }
}
