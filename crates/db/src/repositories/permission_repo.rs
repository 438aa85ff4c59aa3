//! Repository for the `permissions` / `users_permissions` tables.

use std::time::Duration;

use marquee_core::permissions::Permissions;
use marquee_core::types::DbId;
use sqlx::PgPool;

use crate::error::{with_deadline, StoreError};

/// Per-call deadline for permission queries.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Reads and grants user permissions.
pub struct PermissionRepo;

impl PermissionRepo {
    /// All permission codes held by `user_id`.
    pub async fn get_all_for_user(pool: &PgPool, user_id: DbId) -> Result<Permissions, StoreError> {
        let codes = with_deadline(
            QUERY_TIMEOUT,
            sqlx::query_scalar::<_, String>(
                "SELECT permissions.code
                 FROM permissions
                 INNER JOIN users_permissions ON users_permissions.permission_id = permissions.id
                 INNER JOIN users ON users_permissions.user_id = users.id
                 WHERE users.id = $1
                 ORDER BY permissions.code",
            )
            .bind(user_id)
            .fetch_all(pool),
        )
        .await?;

        Ok(Permissions(codes))
    }

    /// Grant `codes` to `user_id`. Existing grants are left in place.
    /// Returns the number of new grants; unknown codes are ignored.
    pub async fn add_for_user(
        pool: &PgPool,
        user_id: DbId,
        codes: &[&str],
    ) -> Result<u64, StoreError> {
        let result = with_deadline(
            QUERY_TIMEOUT,
            sqlx::query(
                "INSERT INTO users_permissions (user_id, permission_id)
                 SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(codes)
            .execute(pool),
        )
        .await?;
        Ok(result.rows_affected())
    }
}
