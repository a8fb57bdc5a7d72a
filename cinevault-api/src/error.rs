/// Error handling for the API server
///
/// A unified error type that maps the domain error taxonomy onto the HTTP
/// surface. All handlers return `Result<T, ApiError>`.
///
/// The status contract matters to clients:
///
/// - `400` malformed input; correct it and retry
/// - `401` unauthenticated; clear the local session and go to login
/// - `403` forbidden by role or subscription; the session is still valid
/// - `409` duplicate email on registration
/// - `500` internal failure
/// - `503` provider unavailable; transient, safe to retry

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use cinevault_shared::auth::service::AuthError;
use cinevault_shared::subscription::SubscriptionError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409); duplicate email
    Conflict(String),

    /// Registration half-applied (500); carries the account id for retry
    PartialRegistration { account_id: Uuid },

    /// Internal server error (500)
    InternalError(String),

    /// Provider unavailable (503)
    ServiceUnavailable(String),
}

/// Error response body
///
/// `success: false` mirrors the success-shape responses, so clients can
/// branch on one field; `error` is a stable machine-readable code.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,

    /// Error code (e.g. "unauthorized", "duplicate_email")
    pub error: String,

    /// Human-readable message
    pub message: String,

    /// Present only for partial registration failures; retry with this id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::PartialRegistration { account_id } => {
                write!(f, "Registration partially completed for {}", account_id)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, account_id) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "duplicate_email", msg, None),
            ApiError::PartialRegistration { account_id } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "partial_registration",
                "Registration partially completed; retry to finish".to_string(),
                Some(account_id),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error_code.to_string(),
            message,
            account_id,
        });

        (status, body).into_response()
    }
}

/// Auth service errors onto the HTTP surface
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError::BadRequest(msg),
            AuthError::WeakCredential(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidCredentials => {
                // One message for unknown email and wrong password alike
                ApiError::Unauthorized(AuthError::InvalidCredentials.to_string())
            }
            AuthError::DuplicateEmail => {
                ApiError::Conflict("Email already registered".to_string())
            }
            AuthError::RoleMismatch(role) => {
                ApiError::Forbidden(format!("Account does not have the {} role", role.as_str()))
            }
            AuthError::CreatorNotApproved => {
                ApiError::Forbidden("Creator account is awaiting approval".to_string())
            }
            AuthError::PartialFailure { account_id } => {
                ApiError::PartialRegistration { account_id }
            }
            AuthError::ProviderUnavailable => {
                ApiError::ServiceUnavailable("Service temporarily unavailable".to_string())
            }
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Subscription manager errors onto the HTTP surface
impl From<SubscriptionError> for ApiError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::InvalidAccountId => {
                ApiError::BadRequest("Invalid account id".to_string())
            }
            SubscriptionError::ProfileNotFound(id) => {
                ApiError::NotFound(format!("No profile for account {}", id))
            }
            SubscriptionError::LedgerWriteFailed => {
                ApiError::InternalError("ledger write failed".to_string())
            }
            SubscriptionError::ProviderUnavailable => {
                ApiError::ServiceUnavailable("Service temporarily unavailable".to_string())
            }
            SubscriptionError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinevault_shared::models::profile::Role;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::Conflict("Email already registered".to_string());
        assert_eq!(err.to_string(), "Conflict: Email already registered");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials)
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::DuplicateEmail).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::RoleMismatch(Role::Admin))
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::ProviderUnavailable)
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(SubscriptionError::InvalidAccountId)
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_partial_registration_carries_account_id() {
        let id = Uuid::new_v4();
        let err = ApiError::from(AuthError::PartialFailure { account_id: id });
        assert!(matches!(
            err,
            ApiError::PartialRegistration { account_id } if account_id == id
        ));
    }
}
