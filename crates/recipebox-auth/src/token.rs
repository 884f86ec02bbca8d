//! Opaque API tokens.
//!
//! A token is 256 random bits, hex-encoded, handed to the client exactly
//! once. Storage only ever sees the SHA-256 digest.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a new cryptographically secure API token (64 hex characters).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// Digest of a token as kept in storage.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(hex::decode(&token).is_ok(), "Token should be valid hex");
    }

    #[test]
    fn test_generate_token_uniqueness() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_hash_token_is_stable() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
        assert_eq!(hash_token(&token).len(), 64);
    }
}
