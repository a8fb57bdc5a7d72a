/// Bearer-token authentication middleware for Axum
///
/// Validates the `Authorization: Bearer <token>` header and injects an
/// [`AuthContext`] into request extensions. Handlers extract it with Axum's
/// `Extension` extractor.
///
/// A 401 from this layer carries a contract for clients: the session is gone,
/// clear the local cache and return to login. 403s (role or subscription)
/// never originate here; those are handler decisions about a valid session.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::profile::Role;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated account ID
    pub account_id: Uuid,

    /// Email at token issue time
    pub email: String,

    /// Role at token issue time
    pub role: Role,
}

/// Error type for the authentication layer
#[derive(Debug)]
pub enum AuthLayerError {
    /// Missing authorization header
    MissingCredentials,

    /// Header present but not a Bearer token
    InvalidFormat,

    /// Token validation failed (bad signature, expired, wrong issuer)
    InvalidToken(String),
}

impl IntoResponse for AuthLayerError {
    fn into_response(self) -> Response {
        match self {
            AuthLayerError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthLayerError::InvalidFormat => {
                (StatusCode::BAD_REQUEST, "Expected Bearer token").into_response()
            }
            AuthLayerError::InvalidToken(msg) => {
                (StatusCode::UNAUTHORIZED, msg).into_response()
            }
        }
    }
}

/// Bearer-token middleware
///
/// # Errors
///
/// - 401 if the header is missing or the token is invalid/expired
/// - 400 if the header is not a Bearer token
pub async fn bearer_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthLayerError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthLayerError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthLayerError::InvalidFormat)?;

    let claims = validate_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthLayerError::InvalidToken("Token expired".to_string()),
        _ => AuthLayerError::InvalidToken("Invalid token".to_string()),
    })?;

    let context = AuthContext {
        account_id: claims.sub,
        email: claims.email,
        role: claims.role,
    };
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_statuses() {
        let response = AuthLayerError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthLayerError::InvalidFormat.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AuthLayerError::InvalidToken("expired".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
