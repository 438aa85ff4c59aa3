//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use marquee_core::tokens::{validate_token_plaintext, SCOPE_AUTHENTICATION};
use marquee_core::validator::Validator;
use marquee_db::models::user::User;
use marquee_db::repositories::UserRepo;
use marquee_db::StoreError;

use crate::error::AppError;
use crate::state::AppState;

const INVALID_TOKEN: &str = "invalid or missing authentication token";

/// Authenticated user resolved from `Authorization: Bearer <token>`.
///
/// Rejects with 401 when the header is absent or the token does not resolve
/// to a live authentication token.
///
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Resolve the caller, if any. `Ok(None)` is an anonymous request; a header
/// that is present but unusable is an error.
pub async fn authenticate(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized(INVALID_TOKEN))?;

    let mut v = Validator::new();
    validate_token_plaintext(&mut v, token);
    if !v.valid() {
        return Err(AppError::unauthorized(INVALID_TOKEN));
    }

    match UserRepo::get_for_token(&state.pool, SCOPE_AUTHENTICATION, token).await {
        Ok(user) => Ok(Some(user)),
        Err(StoreError::NotFound) => Err(AppError::unauthorized(INVALID_TOKEN)),
        Err(e) => Err(e.into()),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
            .await?
            .map(AuthUser)
            .ok_or_else(|| AppError::unauthorized("you must be authenticated to access this resource"))
    }
}
