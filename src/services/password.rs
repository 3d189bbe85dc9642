//! Password hashing module
//!
//! Secure password hashing and verification using Argon2id.
//!
//! # Security
//!
//! - Uses the Argon2id variant with the argon2 crate's default parameters
//! - Generates a random salt for each hash, so two hashes of the same
//!   plaintext differ yet both verify
//! - Comparison runs in constant time inside the argon2 crate

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id with secure defaults.
///
/// Returns the hash as a PHC string (algorithm, parameters, salt, and digest).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored hash.
///
/// Returns `false` for a non-matching password and for any malformed or
/// truncated digest; verification never raises on attacker-supplied input.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_produces_argon2id_hash() {
        let hash = hash_password("test_password_123").expect("Failed to hash password");
        assert!(hash.starts_with("$argon2id$"), "Hash should use Argon2id");
    }

    #[test]
    fn test_hash_password_produces_different_hashes() {
        let password = "same_password";
        let hash1 = hash_password(password).expect("Failed to hash password");
        let hash2 = hash_password(password).expect("Failed to hash password");

        assert_ne!(
            hash1, hash2,
            "Same password should produce different hashes due to random salt"
        );
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "correct_password";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(verify_password(password, &hash));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct_password").expect("Failed to hash password");

        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn test_verify_password_malformed_hash_returns_false() {
        assert!(!verify_password("password", "not_a_phc_string"));
        assert!(!verify_password("password", ""));
        assert!(!verify_password("password", "$argon2id$truncated"));
        assert!(!verify_password("password", "$unknown$v=1$x"));
    }

    #[test]
    fn test_hash_password_unicode() {
        let password = "pässwörd-测试🔐";
        let hash = hash_password(password).expect("Failed to hash unicode password");

        assert!(verify_password(password, &hash));
    }

    #[test]
    fn test_password_hash_not_equal_to_password() {
        let password = "my_secret_password";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(!hash.contains(password));
    }
}
