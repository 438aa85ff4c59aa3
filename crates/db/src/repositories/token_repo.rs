//! Repository for the `tokens` table.

use std::time::Duration;

use marquee_core::tokens::{generate_token, Token};
use marquee_core::types::DbId;
use sqlx::PgPool;

use crate::error::{with_deadline, StoreError};

/// Per-call deadline for token queries.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Issues and invalidates single-use tokens.
pub struct TokenRepo;

impl TokenRepo {
    /// Generate a token for `user_id` and persist its digest.
    ///
    /// The returned token carries the plaintext; this is the only place it
    /// is ever available.
    pub async fn new_token(
        pool: &PgPool,
        user_id: DbId,
        ttl: Duration,
        scope: &str,
    ) -> Result<Token, StoreError> {
        let token = generate_token(user_id, ttl, scope);
        Self::insert(pool, &token).await?;
        tracing::debug!(user_id, scope, expiry = %token.expiry, "Token issued");
        Ok(token)
    }

    /// Persist a token's digest, owner, scope and expiry.
    pub async fn insert(pool: &PgPool, token: &Token) -> Result<(), StoreError> {
        with_deadline(
            QUERY_TIMEOUT,
            sqlx::query(
                "INSERT INTO tokens (hash, user_id, expiry, scope)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(&token.hash)
            .bind(token.user_id)
            .bind(token.expiry)
            .bind(&token.scope)
            .execute(pool),
        )
        .await?;
        Ok(())
    }

    /// Delete every token of `scope` owned by `user_id`. Returns the count
    /// removed.
    pub async fn delete_all_for_user(
        pool: &PgPool,
        scope: &str,
        user_id: DbId,
    ) -> Result<u64, StoreError> {
        let result = with_deadline(
            QUERY_TIMEOUT,
            sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
                .bind(scope)
                .bind(user_id)
                .execute(pool),
        )
        .await?;
        Ok(result.rows_affected())
    }
}
