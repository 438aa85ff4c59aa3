//! Argon2id password hashing.
//!
//! All hashes use the Argon2id variant with a random salt generated via
//! [`OsRng`], stored as a PHC string so algorithm parameters and salt travel
//! with the hash itself.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::validator::Validator;

/// Minimum accepted password length in bytes.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum accepted password length in bytes.
pub const MAX_PASSWORD_LEN: usize = 72;

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(#[from] argon2::password_hash::Error);

/// A user's password: always the PHC hash, plus the plaintext while the
/// request that set it is still validating.
#[derive(Clone, Default)]
pub struct Password {
    plaintext: Option<String>,
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("plaintext", &self.plaintext.as_ref().map(|_| "[redacted]"))
            .field("hash", &"[redacted]")
            .finish()
    }
}

impl Password {
    /// Rebuild from a stored PHC hash.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self {
            plaintext: None,
            hash: hash.into(),
        }
    }

    /// Hash `plaintext` with a fresh salt and keep it for validation.
    pub fn set(&mut self, plaintext: &str) -> Result<(), PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(plaintext.as_bytes(), &salt)?;
        self.hash = hash.to_string();
        self.plaintext = Some(plaintext.to_string());
        Ok(())
    }

    /// Compare `plaintext` against the stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; errors only when the stored hash is
    /// malformed or hashing itself fails.
    pub fn matches(&self, plaintext: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(&self.hash)?;
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn plaintext(&self) -> Option<&str> {
        self.plaintext.as_deref()
    }

    /// Drop the plaintext once validation is done.
    pub fn forget_plaintext(&mut self) {
        self.plaintext = None;
    }
}

impl From<String> for Password {
    fn from(hash: String) -> Self {
        Password::from_hash(hash)
    }
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(
        password.len() >= MIN_PASSWORD_LEN,
        "password",
        "must be at least 8 bytes long",
    );
    v.check(
        password.len() <= MAX_PASSWORD_LEN,
        "password",
        "must not be more than 72 bytes long",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed(plaintext: &str) -> Password {
        let mut password = Password::default();
        password.set(plaintext).expect("hashing should succeed");
        password
    }

    #[test]
    fn set_then_matches() {
        let password = hashed("secret123");
        assert!(password.hash().starts_with("$argon2id$"));
        assert!(password.matches("secret123").unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let password = hashed("secret123");
        assert!(!password.matches("wrong").unwrap());
    }

    #[test]
    fn same_plaintext_hashes_differently() {
        let a = hashed("secret123");
        let b = hashed("secret123");
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn stored_hash_round_trips() {
        let stored = Password::from_hash(hashed("secret123").hash());
        assert!(stored.plaintext().is_none());
        assert!(stored.matches("secret123").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let broken = Password::from_hash("not-a-phc-string");
        assert!(broken.matches("anything").is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let password = hashed("secret123");
        let debug = format!("{password:?}");
        assert!(!debug.contains("secret123"));
        assert!(!debug.contains("argon2id"));
    }

    #[test]
    fn plaintext_length_rules() {
        let mut v = Validator::new();
        validate_password_plaintext(&mut v, "short");
        assert!(!v.valid());

        let mut v = Validator::new();
        validate_password_plaintext(&mut v, &"p".repeat(73));
        assert!(!v.valid());

        let mut v = Validator::new();
        validate_password_plaintext(&mut v, "pa55word");
        assert!(v.valid());
    }
}
