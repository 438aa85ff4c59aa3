//! Handlers for the `/users` resource (registration, activation).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use marquee_core::password::Password;
use marquee_core::permissions::MOVIES_READ;
use marquee_core::tokens::{validate_token_plaintext, SCOPE_ACTIVATION};
use marquee_core::users::validate_user;
use marquee_core::validator::Validator;
use marquee_db::models::user::{CreateUser, UserResponse};
use marquee_db::repositories::{PermissionRepo, TokenRepo, UserRepo};
use marquee_db::StoreError;
use marquee_events::{spawn_mail, Template};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/users`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for `PUT /v1/users/activated`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivateUserRequest {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/users
///
/// Register an inactive account with `movies:read`, then mail the activation
/// token in the background. Returns 202 since delivery has not happened yet.
pub async fn register_user(
    State(state): State<AppState>,
    body: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let Json(input) = body?;

    let mut password = Password::default();
    password.set(&input.password)?;

    let mut v = Validator::new();
    validate_user(&mut v, &input.name, &input.email, &password);
    if !v.valid() {
        return Err(v.into_errors().into());
    }
    password.forget_plaintext();

    let user = UserRepo::insert(
        &state.pool,
        &CreateUser {
            name: input.name,
            email: input.email,
            password,
            activated: false,
        },
    )
    .await?;

    PermissionRepo::add_for_user(&state.pool, user.id, &[MOVIES_READ]).await?;

    let token = TokenRepo::new_token(
        &state.pool,
        user.id,
        state.config.activation_token_ttl,
        SCOPE_ACTIVATION,
    )
    .await?;

    spawn_mail(
        &state.tasks,
        state.mailer.clone(),
        user.email.clone(),
        Template::UserWelcome,
        json!({ "activationToken": token.plaintext, "userID": user.id }),
    );

    tracing::info!(user_id = user.id, "User registered");
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// PUT /v1/users/activated
///
/// Consume an activation token. Every activation token the user holds is
/// deleted on success.
pub async fn activate_user(
    State(state): State<AppState>,
    body: Result<Json<ActivateUserRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let Json(input) = body?;

    let mut v = Validator::new();
    validate_token_plaintext(&mut v, &input.token);
    if !v.valid() {
        return Err(v.into_errors().into());
    }

    let mut user = match UserRepo::get_for_token(&state.pool, SCOPE_ACTIVATION, &input.token).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            return Err(AppError::field("token", "invalid or expired activation token"));
        }
        Err(e) => return Err(e.into()),
    };

    user.activated = true;
    user.version = UserRepo::update(&state.pool, &user).await?;

    TokenRepo::delete_all_for_user(&state.pool, SCOPE_ACTIVATION, user.id).await?;

    tracing::info!(user_id = user.id, "User activated");
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}
