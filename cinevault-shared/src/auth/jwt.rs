/// Bearer token generation and validation
///
/// Tokens are HS256-signed JWTs carrying the account id, email, and role.
/// The role travels in the claims so the API's auth middleware can build a
/// request context without a database round trip; role changes therefore
/// take effect on the next login, which is acceptable for one-way role
/// transitions.
///
/// # Example
///
/// ```
/// use cinevault_shared::auth::jwt::{create_token, validate_token, Claims};
/// use cinevault_shared::models::profile::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new(Uuid::new_v4(), "a@example.com".into(), Role::User);
/// let token = create_token(&claims, "secret-key-of-at-least-32-bytes!")?;
/// let validated = validate_token(&token, "secret-key-of-at-least-32-bytes!")?;
/// assert_eq!(validated.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::Role;

/// Token issuer, checked on validation
const ISSUER: &str = "cinevault";

/// Default token lifetime
const TOKEN_TTL_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("failed to create token: {0}")]
    Create(String),

    /// Token has expired
    #[error("token has expired")]
    Expired,

    /// Signature, issuer, or format problem
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// JWT claims for an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - account ID
    pub sub: Uuid,

    /// Issuer - always "cinevault"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Account email at issue time
    pub email: String,

    /// Role at issue time
    pub role: Role,
}

impl Claims {
    /// Creates claims with the default lifetime
    pub fn new(account_id: Uuid, email: String, role: Role) -> Self {
        Self::with_lifetime(account_id, email, role, Duration::hours(TOKEN_TTL_HOURS))
    }

    /// Creates claims with a custom lifetime (used by tests for expiry)
    pub fn with_lifetime(account_id: Uuid, email: String, role: Role, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: account_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            email,
            role,
        }
    }
}

/// Signs claims into a bearer token (HS256)
///
/// The secret must be at least 32 bytes; the API config enforces that at
/// startup.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| JwtError::Create(e.to_string()))
}

/// Validates a bearer token and extracts its claims
///
/// Checks signature, expiry, and issuer.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}
