//! Store-boundary error taxonomy and deadline helper.

use std::future::Future;
use std::time::Duration;

/// Unique constraint guarding `users.email`.
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "uq_users_email";

/// PostgreSQL SQLSTATE for `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Errors returned by every repository method.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested row (or live token) does not exist.
    #[error("record not found")]
    NotFound,

    /// A conditional write matched no row at the presented version.
    #[error("unable to update the record due to an edit conflict")]
    UpdateConflict,

    /// The email address is already registered.
    #[error("duplicate email")]
    DuplicateEmail,

    /// The storage call did not finish before its deadline.
    #[error("database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Any other storage fault.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// Storage-specific signals a backend must be able to recognise.
///
/// Implemented once per storage technology; the [`From`] conversion into
/// [`StoreError`] is written purely in terms of these methods.
pub trait StorageSignal {
    /// The query expected a row and found none.
    fn is_no_rows(&self) -> bool;

    /// Name of the unique constraint that was violated, if any.
    fn unique_violation(&self) -> Option<&str>;
}

impl StorageSignal for sqlx::Error {
    fn is_no_rows(&self) -> bool {
        matches!(self, sqlx::Error::RowNotFound)
    }

    fn unique_violation(&self) -> Option<&str> {
        match self {
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) =>
            {
                Some(db_err.constraint().unwrap_or("unknown"))
            }
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if err.is_no_rows() {
            return StoreError::NotFound;
        }
        if err.unique_violation() == Some(EMAIL_UNIQUE_CONSTRAINT) {
            return StoreError::DuplicateEmail;
        }
        StoreError::Database(err)
    }
}

/// Run a storage call under a fixed deadline.
///
/// On expiry the inner future is dropped, which aborts the in-flight query
/// and returns its connection to the pool.
pub async fn with_deadline<T, F>(limit: Duration, op: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Database operation timed out");
            Err(StoreError::Timeout(limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn no_rows_translates_to_not_found() {
        assert_matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn other_errors_stay_opaque() {
        assert_matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Database(sqlx::Error::PoolTimedOut)
        );
    }

    #[tokio::test]
    async fn deadline_expiry_is_a_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, sqlx::Error>(())
        };
        let result = with_deadline(Duration::from_millis(10), slow).await;
        assert_matches!(result, Err(StoreError::Timeout(d)) if d == Duration::from_millis(10));
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, sqlx::Error>(7) }).await;
        assert_matches!(result, Ok(7));
    }
}
