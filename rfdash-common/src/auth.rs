//! Credential hashing and session token signing
//!
//! # Architecture
//!
//! - Account passwords are stored as bcrypt hashes (salt embedded in the hash)
//! - Session tokens are 32 random bytes rendered as 64 hex characters
//! - The session cookie carries `token.signature`, where the signature is the
//!   SHA-256 of the token with the server secret key appended
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions.
//! No HTTP framework dependencies - cookie handling lives in rfdash-ui.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 4;

// ========================================
// Error Types
// ========================================

/// Credential error types
#[derive(Debug, Clone)]
pub enum CredentialError {
    /// Password does not meet the length rule
    PasswordTooShort { min: usize },

    /// bcrypt failed to hash or parse a stored hash
    Hashing(String),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::PasswordTooShort { min } => {
                write!(f, "Password must be at least {} characters", min)
            }
            CredentialError::Hashing(err) => write!(f, "Password hashing failed: {}", err),
        }
    }
}

impl std::error::Error for CredentialError {}

// ========================================
// Password Hashing
// ========================================

/// Check a candidate password against the length rule
pub fn validate_password(password: &str) -> Result<(), CredentialError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Hash a password with bcrypt at the given cost
///
/// # Examples
///
/// ```
/// use rfdash_common::auth::{hash_password, verify_password};
///
/// let hash = hash_password("secret", 4).unwrap();
/// assert!(verify_password("secret", &hash));
/// assert!(!verify_password("wrong", &hash));
/// ```
pub fn hash_password(password: &str, cost: u32) -> Result<String, CredentialError> {
    bcrypt::hash(password, cost).map_err(|e| CredentialError::Hashing(e.to_string()))
}

/// Verify a password against a stored bcrypt hash
///
/// A malformed stored hash verifies as false rather than erroring, so a
/// corrupt row can never authenticate.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or(false)
}

// ========================================
// Session Tokens
// ========================================

/// Generate a fresh random session token (64 hex characters)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Calculate the signature for a session token
///
/// # Algorithm
///
/// 1. Append the secret key to the token
/// 2. Calculate SHA-256 of the concatenated string
/// 3. Return as 64 hex characters
pub fn sign_token(token: &str, secret_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(secret_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build the signed cookie value `token.signature`
pub fn signed_cookie_value(token: &str, secret_key: &str) -> String {
    format!("{}.{}", token, sign_token(token, secret_key))
}

/// Split and verify a signed cookie value
///
/// Returns the token when the signature matches, `None` otherwise.
///
/// # Examples
///
/// ```
/// use rfdash_common::auth::{signed_cookie_value, verify_cookie_value};
///
/// let value = signed_cookie_value("abc123", "key");
/// assert_eq!(verify_cookie_value(&value, "key"), Some("abc123"));
/// assert_eq!(verify_cookie_value(&value, "other-key"), None);
/// ```
pub fn verify_cookie_value<'a>(value: &'a str, secret_key: &str) -> Option<&'a str> {
    let (token, signature) = value.split_once('.')?;
    if token.is_empty() {
        return None;
    }
    let expected = sign_token(token, secret_key);
    if constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        Some(token)
    } else {
        None
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_rule() {
        assert!(validate_password("abc").is_err());
        assert!(validate_password("abcd").is_ok());
        // Counted in characters, not bytes
        assert!(validate_password("ãã").is_err());
    }

    #[test]
    fn test_hash_is_salted() {
        let h1 = hash_password("same", 4).unwrap();
        let h2 = hash_password("same", 4).unwrap();
        assert_ne!(h1, h2);
        assert!(verify_password("same", &h1));
        assert!(verify_password("same", &h2));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_session_tokens_are_random_hex() {
        let t1 = generate_session_token();
        let t2 = generate_session_token();
        assert_eq!(t1.len(), 64);
        assert!(t1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_tampered_cookie_rejected() {
        let value = signed_cookie_value("token", "secret");
        let tampered = value.replacen("token", "tokem", 1);
        assert_eq!(verify_cookie_value(&tampered, "secret"), None);
        assert_eq!(verify_cookie_value("no-dot", "secret"), None);
        assert_eq!(verify_cookie_value(".sig", "secret"), None);
    }
}
