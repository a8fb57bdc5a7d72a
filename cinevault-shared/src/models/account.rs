/// Account records owned by the identity store
///
/// An account holds the credential and public profile text for one person.
/// Role and subscription state deliberately live elsewhere (see
/// [`crate::models::profile`]): the identity store only ever answers "who is
/// this and is their password right".
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     username VARCHAR(64) NOT NULL,
///     display_name VARCHAR(128) NOT NULL,
///     bio TEXT,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity-store account record
///
/// The `id` is stable for the lifetime of the account. Passwords are stored
/// as Argon2id PHC hashes and the hash never leaves this crate in a
/// serialized response.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Unique account ID (UUID v4), immutable once created
    pub id: Uuid,

    /// Email address, unique and case-insensitive (stored lowercased)
    pub email: String,

    /// Short handle shown in lists and comments
    pub username: String,

    /// Full display name
    pub display_name: String,

    /// Optional free-text bio
    pub bio: Option<String>,

    /// Argon2id password hash, never exposed to callers
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the account last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new account
///
/// The password arrives already hashed; plaintext never reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Email address (will be lowercased before storage)
    pub email: String,

    /// Short handle
    pub username: String,

    /// Full display name
    pub display_name: String,

    /// Optional bio
    pub bio: Option<String>,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,
}

/// Mutable account fields, updatable by the owning account only
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAccount {
    /// New email address
    pub email: Option<String>,

    /// New display name
    pub display_name: Option<String>,

    /// New bio (Some(None) clears it)
    pub bio: Option<Option<String>>,
}

impl Account {
    /// Normalizes an email for storage and lookup
    ///
    /// Uniqueness is case-insensitive, so every path that touches the email
    /// column goes through this first.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(Account::normalize_email("User@Example.COM"), "user@example.com");
        assert_eq!(Account::normalize_email("  padded@example.com "), "padded@example.com");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let account = Account {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            username: "a".to_string(),
            display_name: "A".to_string(),
            bio: None,
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        };

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
    }
}
