//! Handlers for the `/tokens` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use marquee_core::password::validate_password_plaintext;
use marquee_core::tokens::{SCOPE_ACTIVATION, SCOPE_AUTHENTICATION};
use marquee_core::types::Timestamp;
use marquee_core::users::validate_email;
use marquee_core::validator::Validator;
use marquee_db::repositories::{TokenRepo, UserRepo};
use marquee_db::StoreError;
use marquee_events::{spawn_mail, Template};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "invalid authentication credentials";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/tokens/activation`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResendActivationRequest {
    pub email: String,
}

/// Request body for `POST /v1/tokens/authentication`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationRequest {
    pub email: String,
    pub password: String,
}

/// A freshly issued bearer token. The plaintext is never shown again.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expiry: Timestamp,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/tokens/activation
///
/// Issue and mail a fresh activation token for an account that is not yet
/// activated.
pub async fn create_activation_token(
    State(state): State<AppState>,
    body: Result<Json<ResendActivationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<MessageResponse>>)> {
    let Json(input) = body?;

    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    if !v.valid() {
        return Err(v.into_errors().into());
    }

    let user = match UserRepo::get_by_email(&state.pool, &input.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            return Err(AppError::BadRequest(
                "no user found with this email address".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if user.activated {
        return Err(AppError::field("email", "user has already been activated"));
    }

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
        Template::TokenActivation,
        json!({ "activationToken": token.plaintext, "userID": user.id }),
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new(
            "an email will be sent to you containing activation instructions",
        )),
    ))
}

/// POST /v1/tokens/authentication
///
/// Exchange email + password for an authentication token. Unknown emails and
/// wrong passwords are indistinguishable to the caller.
pub async fn create_authentication_token(
    State(state): State<AppState>,
    body: Result<Json<AuthenticationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<TokenResponse>>)> {
    let Json(input) = body?;

    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);
    if !v.valid() {
        return Err(v.into_errors().into());
    }

    let user = match UserRepo::get_by_email(&state.pool, &input.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(AppError::unauthorized(INVALID_CREDENTIALS)),
        Err(e) => return Err(e.into()),
    };

    if !user.password.matches(&input.password)? {
        tracing::debug!(user_id = user.id, "Password mismatch");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = TokenRepo::new_token(
        &state.pool,
        user.id,
        state.config.auth_token_ttl,
        SCOPE_AUTHENTICATION,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: TokenResponse {
                token: token.plaintext,
                expiry: token.expiry,
            },
        }),
    ))
}
