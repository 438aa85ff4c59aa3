//! Field-level validation accumulator.
//!
//! A [`Validator`] collects every failed check for an entity so a single
//! request can report all violations at once. Checks never short-circuit:
//! run all of them, then inspect [`Validator::valid`].

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Loose RFC 5322-shaped address pattern used for email checks.
pub static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered list of failed checks, as surfaced to API callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    /// A single-field failure, used when a store-level signal (e.g. a
    /// duplicate email) has to be reported in validation shape.
    pub fn single(field: &str, message: &str) -> Self {
        Self(vec![FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether any failure was recorded against `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", joined.join("; "))
    }
}

/// Mutable accumulator of field/message failures.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no check has failed.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record a failure unconditionally.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Record a failure when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    /// Append failures collected elsewhere, keeping their order.
    pub fn merge(&mut self, errors: ValidationErrors) {
        self.errors.extend(errors.0);
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> ValidationErrors {
        ValidationErrors(self.errors)
    }
}

/// `true` if `value` is one of `list`.
pub fn permitted_value<T: PartialEq>(value: &T, list: &[T]) -> bool {
    list.iter().any(|candidate| candidate == value)
}

/// `true` if `value` matches `re`.
pub fn matches(value: &str, re: &Regex) -> bool {
    re.is_match(value)
}

/// `true` if every element of `values` is distinct.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let set: HashSet<&T> = values.iter().collect();
    set.len() == values.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_validator_is_valid() {
        let v = Validator::new();
        assert!(v.valid());
        assert!(v.errors().is_empty());
    }

    #[test]
    fn failed_checks_accumulate_without_short_circuit() {
        let mut v = Validator::new();
        v.check(false, "title", "must be provided");
        v.check(true, "year", "never recorded");
        v.check(false, "runtime", "must be positive");
        v.check(false, "title", "second title problem");

        assert!(!v.valid());
        let errors = v.into_errors();
        assert_eq!(errors.len(), 3);
        assert!(errors.has_field("title"));
        assert!(errors.has_field("runtime"));
        assert!(!errors.has_field("year"));
    }

    #[test]
    fn unique_detects_duplicates() {
        assert!(unique(&["a", "b", "c"]));
        assert!(!unique(&["sci-fi", "sci-fi"]));
        assert!(unique::<&str>(&[]));
    }

    #[test]
    fn permitted_value_checks_membership() {
        assert!(permitted_value(&"id", &["id", "-id"]));
        assert!(!permitted_value(&"name", &["id", "-id"]));
    }

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(matches("alice@example.com", &EMAIL_RE));
        assert!(!matches("alice@", &EMAIL_RE));
        assert!(!matches("no-at-sign.example.com", &EMAIL_RE));
    }

    #[test]
    fn validation_errors_serialize_as_list() {
        let errors = ValidationErrors::single("email", "a user with this email address already exists");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json[0]["field"], "email");
        assert!(json[0]["message"].is_string());
    }
}
