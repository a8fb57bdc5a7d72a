/// Password hashing and strength policy
///
/// Hashing uses Argon2id in PHC string format; verification parses the
/// parameters back out of the stored hash, so parameter upgrades roll out
/// naturally as accounts re-hash on password change.
///
/// There is exactly one strength policy, applied to registration and to
/// password reset alike: at least [`MIN_PASSWORD_LEN`] characters with at
/// least one uppercase letter, one lowercase letter, and one digit.
///
/// # Example
///
/// ```
/// use cinevault_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Str0ngEnough")?;
/// assert!(verify_password("Str0ngEnough", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Minimum password length, shared by registration and reset
pub const MIN_PASSWORD_LEN: usize = 8;

/// Error type for password operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("failed to hash password: {0}")]
    Hash(String),

    /// Failed to verify password
    #[error("failed to verify password: {0}")]
    Verify(String),

    /// Stored hash is not valid PHC format
    #[error("invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with Argon2id and a fresh random salt
///
/// # Errors
///
/// Returns `PasswordError::Hash` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash (constant-time)
///
/// Returns `Ok(false)` for a wrong password; errors only on a malformed
/// stored hash or an internal failure.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Verify(e.to_string())),
    }
}

/// Validates the canonical password-strength policy
///
/// The source of truth for both registration and reset; do not add a second
/// policy elsewhere.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_phc_argon2id() {
        let hash = hash_password("Sup3rSecret").expect("hash should succeed");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let h1 = hash_password("Sup3rSecret").unwrap();
        let h2 = hash_password("Sup3rSecret").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_password("Sup3rSecret").unwrap();
        assert!(verify_password("Sup3rSecret", &hash).unwrap());
        assert!(!verify_password("sup3rsecret", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_malformed_hash_errors() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }

    #[test]
    fn test_policy_accepts_valid() {
        assert!(validate_password_strength("Abcdef12").is_ok());
        assert!(validate_password_strength("LongerPassw0rd").is_ok());
    }

    #[test]
    fn test_policy_rejects_short() {
        let err = validate_password_strength("Ab1").unwrap_err();
        assert!(err.contains("at least 8"));
    }

    #[test]
    fn test_policy_rejects_missing_classes() {
        assert!(validate_password_strength("alllower1").is_err());
        assert!(validate_password_strength("ALLUPPER1").is_err());
        assert!(validate_password_strength("NoDigitsHere").is_err());
    }
}
