/// Access guard: the per-view authorization decision
///
/// [`evaluate`] is a pure function from session state and a declarative
/// requirement to a decision. It never performs IO, never redirects, and
/// never throws; prompts, timers, and navigation are view-layer concerns
/// driven by the returned decision. The current time is a parameter, not a
/// clock read, so evaluation is referentially transparent and the expiry
/// edge is testable.
///
/// # Decision order
///
/// 1. Session still loading → [`AccessDecision::Pending`]
/// 2. No session → deny `Unauthenticated`, redirect to the login path
/// 3. Role requirement unmet → deny `RoleForbidden`
/// 4. Subscription requirement unmet → deny `SubscriptionRequired`,
///    redirect to the subscribe path (admins bypass this step)
/// 5. Otherwise → [`AccessDecision::Allow`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionUser;
use crate::models::profile::Role;

/// Where an unauthenticated visitor is sent
pub const LOGIN_PATH: &str = "/login";

/// Where a non-subscriber is sent when subscription is required
pub const SUBSCRIBE_PATH: &str = "/pricing";

/// Declarative requirement attached to a protected view or route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    /// Allowed roles; empty means any authenticated account
    pub roles: Vec<Role>,

    /// Whether an active subscription is required
    pub require_subscription: bool,
}

impl Requirement {
    /// Any authenticated account
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Restrict to the given roles
    pub fn roles(roles: &[Role]) -> Self {
        Self {
            roles: roles.to_vec(),
            require_subscription: false,
        }
    }

    /// Additionally require an active subscription
    pub fn with_subscription(mut self) -> Self {
        self.require_subscription = true;
        self
    }
}

/// Why access was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No authenticated session
    Unauthenticated,

    /// Session role not in the allowed set
    RoleForbidden,

    /// Active subscription required but absent
    SubscriptionRequired,
}

/// Outcome of an access evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Render the protected view
    Allow,

    /// Session restore in flight; render a loading state, do not redirect
    Pending,

    /// Access denied
    Deny {
        reason: DenyReason,
        /// Where the view layer should navigate, if anywhere
        redirect_to: Option<&'static str>,
    },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Evaluates a requirement against the current session state
pub fn evaluate(
    session: Option<&SessionUser>,
    loading: bool,
    requirement: &Requirement,
    now: DateTime<Utc>,
) -> AccessDecision {
    if loading {
        return AccessDecision::Pending;
    }

    let Some(user) = session else {
        return AccessDecision::Deny {
            reason: DenyReason::Unauthenticated,
            redirect_to: Some(LOGIN_PATH),
        };
    };

    if !requirement.roles.is_empty() && !requirement.roles.contains(&user.role) {
        return AccessDecision::Deny {
            reason: DenyReason::RoleForbidden,
            redirect_to: None,
        };
    }

    // Admins satisfy the subscription requirement unconditionally; this is
    // an operational escape hatch, not a billing feature.
    if requirement.require_subscription
        && user.role != Role::Admin
        && !user.has_active_subscription(now)
    {
        return AccessDecision::Deny {
            reason: DenyReason::SubscriptionRequired,
            redirect_to: Some(SUBSCRIBE_PATH),
        };
    }

    AccessDecision::Allow
}
