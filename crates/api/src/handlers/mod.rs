pub mod movies;
pub mod tokens;
pub mod users;

use marquee_core::error::CoreError;
use marquee_core::types::DbId;

use crate::error::{AppError, AppResult};

/// Parse a path ID. Anything that is not a positive integer is treated as a
/// missing `entity`.
pub fn parse_id(raw: &str, entity: &'static str) -> AppResult<DbId> {
    raw.parse::<DbId>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or(AppError::Core(CoreError::NotFound { entity }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_id_accepts_only_positive_integers() {
        assert_eq!(parse_id("42", "movie").unwrap(), 42);
        assert_matches!(
            parse_id("0", "movie"),
            Err(AppError::Core(CoreError::NotFound { entity: "movie" }))
        );
        assert!(parse_id("-3", "movie").is_err());
        assert!(parse_id("abc", "movie").is_err());
    }
}
