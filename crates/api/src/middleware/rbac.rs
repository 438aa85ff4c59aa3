//! Permission extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose account is
//! not activated or lacks the permission code. Use these in route handlers
//! to enforce authorization at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use marquee_core::permissions::{MOVIES_READ, MOVIES_WRITE};
use marquee_db::models::user::User;
use marquee_db::repositories::PermissionRepo;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires an activated account. Rejects with 403 Forbidden otherwise.
pub struct RequireActivated(pub User);

impl FromRequestParts<AppState> for RequireActivated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.activated {
            return Err(AppError::forbidden(
                "your user account must be activated to access this resource",
            ));
        }
        Ok(RequireActivated(user))
    }
}

async fn require_permission(
    parts: &mut Parts,
    state: &AppState,
    code: &str,
) -> Result<User, AppError> {
    let RequireActivated(user) = RequireActivated::from_request_parts(parts, state).await?;

    let permissions = PermissionRepo::get_all_for_user(&state.pool, user.id).await?;
    if !permissions.include(code) {
        tracing::debug!(user_id = user.id, code, "Permission denied");
        return Err(AppError::forbidden(
            "your user account doesn't have the necessary permissions to access this resource",
        ));
    }
    Ok(user)
}

/// Requires `movies:read`.
///
/// ```ignore
/// async fn list(RequireMoviesRead(user): RequireMoviesRead) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireMoviesRead(pub User);

impl FromRequestParts<AppState> for RequireMoviesRead {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_permission(parts, state, MOVIES_READ)
            .await
            .map(RequireMoviesRead)
    }
}

/// Requires `movies:write`.
pub struct RequireMoviesWrite(pub User);

impl FromRequestParts<AppState> for RequireMoviesWrite {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_permission(parts, state, MOVIES_WRITE)
            .await
            .map(RequireMoviesWrite)
    }
}
