//! Single-use bearer token generation and hashing.
//!
//! Tokens are 16 random bytes encoded as 26 upper-case base32 characters.
//! Only the SHA-256 hex digest of the plaintext is ever persisted; the
//! plaintext is handed to the caller once and cannot be recovered.

use std::time::Duration;

use data_encoding::BASE32_NOPAD;
use rand::RngCore;

use crate::types::{DbId, Timestamp};
use crate::validator::Validator;

/// Scope for account activation tokens.
pub const SCOPE_ACTIVATION: &str = "activation";

/// Scope for API authentication tokens.
pub const SCOPE_AUTHENTICATION: &str = "authentication";

/// Bytes of entropy per token.
pub const TOKEN_ENTROPY_BYTES: usize = 16;

/// Length of the encoded plaintext (`ceil(16 * 8 / 5)`).
pub const TOKEN_PLAINTEXT_LEN: usize = 26;

/// A freshly generated token. `plaintext` is never stored.
#[derive(Debug, Clone)]
pub struct Token {
    pub plaintext: String,
    pub hash: String,
    pub user_id: DbId,
    pub expiry: Timestamp,
    pub scope: String,
}

/// Generate a token for `user_id` valid for `ttl`.
pub fn generate_token(user_id: DbId, ttl: Duration, scope: &str) -> Token {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);

    let plaintext = BASE32_NOPAD.encode(&bytes);
    let hash = hash_token(&plaintext);

    Token {
        plaintext,
        hash,
        user_id,
        expiry: expiry_after(ttl),
        scope: scope.to_string(),
    }
}

/// `now + ttl`, saturating at the latest representable timestamp when the
/// TTL is too large for `chrono`.
fn expiry_after(ttl: Duration) -> Timestamp {
    let now = chrono::Utc::now();
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
}

/// Digest used to look tokens up. Deterministic so a presented plaintext can
/// be matched against the stored row.
pub fn hash_token(plaintext: &str) -> String {
    crate::hashing::sha256_hex(plaintext.as_bytes())
}

pub fn validate_token_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", "must be provided");
    v.check(
        plaintext.len() == TOKEN_PLAINTEXT_LEN,
        "token",
        "must be 26 bytes long",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base32_matches_rfc4648_vectors() {
        assert_eq!(BASE32_NOPAD.encode(b""), "");
        assert_eq!(BASE32_NOPAD.encode(b"f"), "MY");
        assert_eq!(BASE32_NOPAD.encode(b"fo"), "MZXQ");
        assert_eq!(BASE32_NOPAD.encode(b"foo"), "MZXW6");
        assert_eq!(BASE32_NOPAD.encode(b"foob"), "MZXW6YQ");
        assert_eq!(BASE32_NOPAD.encode(b"fooba"), "MZXW6YTB");
        assert_eq!(BASE32_NOPAD.encode(b"foobar"), "MZXW6YTBOI");
    }

    #[test]
    fn oversized_ttl_saturates_instead_of_wrapping() {
        let token = generate_token(1, Duration::from_secs(u64::MAX), SCOPE_AUTHENTICATION);
        assert_eq!(token.expiry, chrono::DateTime::<chrono::Utc>::MAX_UTC);

        let far = generate_token(1, Duration::from_secs(400 * 24 * 3600), SCOPE_AUTHENTICATION);
        assert!(far.expiry > chrono::Utc::now() + chrono::Duration::days(399));
    }

    #[test]
    fn generated_token_shape() {
        let token = generate_token(7, Duration::from_secs(60), SCOPE_ACTIVATION);
        assert_eq!(token.plaintext.len(), TOKEN_PLAINTEXT_LEN);
        assert!(token
            .plaintext
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
        assert_eq!(token.hash, hash_token(&token.plaintext));
        assert_eq!(token.hash.len(), 64);
        assert_eq!(token.user_id, 7);
        assert_eq!(token.scope, "activation");
        assert!(token.expiry > chrono::Utc::now());
    }

    #[test]
    fn tokens_are_unique() {
        let a = generate_token(1, Duration::from_secs(60), SCOPE_ACTIVATION);
        let b = generate_token(1, Duration::from_secs(60), SCOPE_ACTIVATION);
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn plaintext_validation() {
        let mut v = Validator::new();
        validate_token_plaintext(&mut v, "");
        assert!(!v.valid());

        let mut v = Validator::new();
        validate_token_plaintext(&mut v, "TOOSHORT");
        assert!(!v.valid());

        let token = generate_token(1, Duration::from_secs(60), SCOPE_ACTIVATION);
        let mut v = Validator::new();
        validate_token_plaintext(&mut v, &token.plaintext);
        assert!(v.valid());
    }
}
