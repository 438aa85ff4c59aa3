//! Repository for the `users` table.

use std::time::Duration;

use chrono::Utc;
use marquee_core::tokens::hash_token;
use marquee_core::types::DbId;
use sqlx::PgPool;

use crate::error::{with_deadline, StoreError};
use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, created_at, name, email, password_hash, activated, version";

/// Per-call deadline for user queries.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    ///
    /// Case-insensitive email uniqueness is enforced by the `uq_users_email`
    /// index and surfaces as [`StoreError::DuplicateEmail`].
    pub async fn insert(pool: &PgPool, input: &CreateUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, activated)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        with_deadline(
            QUERY_TIMEOUT,
            sqlx::query_as::<_, User>(&query)
                .bind(&input.name)
                .bind(&input.email)
                .bind(input.password.hash())
                .bind(input.activated)
                .fetch_one(pool),
        )
        .await
    }

    /// Fetch a user by internal ID.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<User, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        with_deadline(
            QUERY_TIMEOUT,
            sqlx::query_as::<_, User>(&query).bind(id).fetch_one(pool),
        )
        .await
    }

    /// Fetch a user by email, ignoring case.
    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<User, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        with_deadline(
            QUERY_TIMEOUT,
            sqlx::query_as::<_, User>(&query).bind(email).fetch_one(pool),
        )
        .await
    }

    /// Write every mutable field of `user`, conditional on the row still
    /// being at `user.version`. Returns the new version.
    pub async fn update(pool: &PgPool, user: &User) -> Result<i32, StoreError> {
        let version = with_deadline(
            QUERY_TIMEOUT,
            sqlx::query_scalar::<_, i32>(
                "UPDATE users
                 SET name = $1, email = $2, password_hash = $3, activated = $4,
                     version = version + 1
                 WHERE id = $5 AND version = $6
                 RETURNING version",
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.password.hash())
            .bind(user.activated)
            .bind(user.id)
            .bind(user.version)
            .fetch_optional(pool),
        )
        .await?;

        version.ok_or(StoreError::UpdateConflict)
    }

    /// Resolve the owner of a live token.
    ///
    /// The plaintext is hashed before the lookup; only the digest touches
    /// storage. A wrong digest, wrong scope and an expired token all yield
    /// the same [`StoreError::NotFound`].
    pub async fn get_for_token(
        pool: &PgPool,
        scope: &str,
        plaintext: &str,
    ) -> Result<User, StoreError> {
        let token_hash = hash_token(plaintext);

        with_deadline(
            QUERY_TIMEOUT,
            sqlx::query_as::<_, User>(
                "SELECT users.id, users.created_at, users.name, users.email,
                        users.password_hash, users.activated, users.version
                 FROM users
                 INNER JOIN tokens ON users.id = tokens.user_id
                 WHERE tokens.hash = $1
                   AND tokens.scope = $2
                   AND tokens.expiry > $3",
            )
            .bind(token_hash)
            .bind(scope)
            .bind(Utc::now())
            .fetch_one(pool),
        )
        .await
    }
}
