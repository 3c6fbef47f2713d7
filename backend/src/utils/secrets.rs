//! One-way hashing and random-token generation for credential secrets.
//!
//! Every secret stored on a user row (password, verify token, reset token,
//! refresh token) goes through this module: only digests are persisted,
//! never plaintext.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::errors::{ServiceError, ServiceResult};

/// Stateless hasher for credential secrets.
///
/// Argon2id with a fresh random salt per call, so the same input yields a
/// different digest every time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretHasher;

impl SecretHasher {
    /// Hashes a secret for storage.
    pub fn hash(&self, secret: &str) -> ServiceResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = %e, "argon2 hash error");
                ServiceError::internal_error("secret hashing failed")
            })?
            .to_string();
        Ok(hash)
    }

    /// Checks a secret against a stored digest.
    ///
    /// Returns false on mismatch and on a malformed digest; never errors.
    pub fn verify(&self, secret: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }

    /// Generates a hex-encoded token from `byte_len` random bytes.
    pub fn generate_token(&self, byte_len: usize) -> String {
        let mut bytes = vec![0u8; byte_len];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hasher = SecretHasher;
        let hash = hasher.hash("Secur3P@ssw0rd!").expect("hashing should succeed");
        assert!(hasher.verify("Secur3P@ssw0rd!", &hash));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let hasher = SecretHasher;
        let hash = hasher
            .hash("correct-horse-battery-staple")
            .expect("hashing should succeed");
        assert!(!hasher.verify("wrong-password", &hash));
    }

    #[test]
    fn verify_returns_false_on_malformed_digest() {
        let hasher = SecretHasher;
        assert!(!hasher.verify("anything", "not-a-valid-hash"));
    }

    #[test]
    fn hashing_is_salted() {
        let hasher = SecretHasher;
        let a = hasher.hash("same-input").unwrap();
        let b = hasher.hash("same-input").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("same-input", &a));
        assert!(hasher.verify("same-input", &b));
    }

    #[test]
    fn generated_tokens_are_hex_and_unique() {
        let hasher = SecretHasher;
        let token = hasher.generate_token(32);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, hasher.generate_token(32));
    }
}
