//! User account rules.

use crate::password::{validate_password_plaintext, Password};
use crate::validator::{matches, Validator, EMAIL_RE};

/// Maximum display name length in bytes.
pub const MAX_NAME_LEN: usize = 100;

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(
        matches(email, &EMAIL_RE),
        "email",
        "must be a valid email address",
    );
}

/// Validate a user about to be written. The plaintext password is checked
/// only while it is still held on `password`.
pub fn validate_user(v: &mut Validator, name: &str, email: &str, password: &Password) {
    v.check(!name.is_empty(), "name", "must be provided");
    v.check(
        name.len() <= MAX_NAME_LEN,
        "name",
        "must not be more than 100 bytes long",
    );

    validate_email(v, email);

    if let Some(plaintext) = password.plaintext() {
        validate_password_plaintext(v, plaintext);
    }

    v.check(!password.hash().is_empty(), "password", "must be provided");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password(plaintext: &str) -> Password {
        let mut p = Password::default();
        p.set(plaintext).unwrap();
        p
    }

    #[test]
    fn valid_user_passes() {
        let mut v = Validator::new();
        validate_user(&mut v, "Alice", "alice@example.com", &password("pa55word"));
        assert!(v.valid(), "unexpected errors: {:?}", v.errors());
    }

    #[test]
    fn every_problem_is_reported() {
        let mut v = Validator::new();
        validate_user(&mut v, "", "not-an-email", &password("short"));
        let errors = v.into_errors();
        assert!(errors.has_field("name"));
        assert!(errors.has_field("email"));
        assert!(errors.has_field("password"));
    }

    #[test]
    fn long_name_fails() {
        let mut v = Validator::new();
        let name = "n".repeat(101);
        validate_user(&mut v, &name, "a@b.io", &password("pa55word"));
        assert!(v.into_errors().has_field("name"));
    }

    #[test]
    fn stored_hash_skips_plaintext_rules() {
        let stored = Password::from_hash(password("pa55word").hash());
        let mut v = Validator::new();
        validate_user(&mut v, "Bob", "bob@example.com", &stored);
        assert!(v.valid());
    }

    #[test]
    fn missing_hash_fails() {
        let mut v = Validator::new();
        validate_user(&mut v, "Bob", "bob@example.com", &Password::default());
        assert!(v.into_errors().has_field("password"));
    }
}
