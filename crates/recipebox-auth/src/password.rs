//! Password hashing and verification.
//!
//! # Security
//!
//! - Hashing uses Argon2id (hybrid mode) with default parameters
//! - Salts are generated using OsRng (cryptographically secure RNG)
//! - Hashes are stored in PHC string format
//!
//! # Example
//!
//! ```
//! use recipebox_auth::password::{hash_password, verify_password};
//!
//! let hash = hash_password("testpass123").unwrap();
//! assert!(verify_password("testpass123", &hash).unwrap());
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::AuthResult;

/// Hash a password for secure storage using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::Hashing` if hashing fails (rare).
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_uses_argon2id() {
        let hash = hash_password("testpass123").unwrap();
        assert!(hash.starts_with("$argon2id$"), "Hash should use Argon2id");
    }

    #[test]
    fn test_verify_correct_password() {
        let hash = hash_password("testpass123").unwrap();
        assert!(verify_password("testpass123", &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("testpass123").unwrap();
        assert!(!verify_password("wrongpass", &hash).unwrap());
    }

    #[test]
    fn test_hash_produces_different_hashes() {
        let hash1 = hash_password("testpass123").unwrap();
        let hash2 = hash_password("testpass123").unwrap();

        // Random salt per call
        assert_ne!(hash1, hash2);
        assert!(verify_password("testpass123", &hash1).unwrap());
        assert!(verify_password("testpass123", &hash2).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash_format() {
        let result = verify_password("testpass123", "invalid_hash_format");
        assert!(result.is_err(), "Invalid hash format should return an error");
    }
}
