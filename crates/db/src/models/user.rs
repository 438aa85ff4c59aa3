//! User entity model and DTOs.

use marquee_core::password::Password;
use marquee_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Holds the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub created_at: Timestamp,
    pub name: String,
    pub email: String,
    #[sqlx(rename = "password_hash", try_from = "String")]
    pub password: Password,
    pub activated: bool,
    pub version: i32,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub created_at: Timestamp,
    pub name: String,
    pub email: String,
    pub activated: bool,
    pub version: i32,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            name: user.name.clone(),
            email: user.email.clone(),
            activated: user.activated,
            version: user.version,
        }
    }
}

/// DTO for creating a new user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: Password,
    pub activated: bool,
}
