use axum::extract::rejection::JsonRejection;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use marquee_core::error::CoreError;
use marquee_core::password::PasswordError;
use marquee_core::validator::ValidationErrors;
use marquee_db::StoreError;
use serde_json::json;

/// Message returned for every 500; the detail goes to the log only.
const INTERNAL_MESSAGE: &str = "the server encountered a problem and could not process your request";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors, [`StoreError`] for persistence
/// errors and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `marquee_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A repository error from `marquee_db`.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The client's request budget is exhausted.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(errors))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge(rejection.body_text());
        }
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// A 422 carrying a single field failure.
    pub fn field(field: &str, message: &str) -> Self {
        ValidationErrors::single(field, message).into()
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Core(CoreError::Unauthorized(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Core(CoreError::Forbidden(message.into()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields = None;

        let (status, code, message) = match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("the requested {entity} could not be found"),
                ),
                CoreError::Validation(errors) => {
                    let message = errors.to_string();
                    fields = Some(errors);
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
                }
                CoreError::UpdateConflict(msg) => (StatusCode::CONFLICT, "EDIT_CONFLICT", msg),
                CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Store errors ---
            AppError::Store(err) => match err {
                StoreError::NotFound => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "the requested resource could not be found".to_string(),
                ),
                StoreError::UpdateConflict => (
                    StatusCode::CONFLICT,
                    "EDIT_CONFLICT",
                    "unable to update the record due to an edit conflict, please try again"
                        .to_string(),
                ),
                StoreError::DuplicateEmail => {
                    let errors = ValidationErrors::single(
                        "email",
                        "a user with this email address already exists",
                    );
                    let message = errors.to_string();
                    fields = Some(errors);
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
                }
                StoreError::Timeout(limit) => {
                    tracing::warn!(timeout_ms = limit.as_millis() as u64, "Storage deadline exceeded");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "TIMEOUT",
                        "the server is temporarily unable to handle the request".to_string(),
                    )
                }
                StoreError::Database(err) => {
                    tracing::error!(error = %err, "Database error");
                    internal()
                }
            },

            AppError::Password(err) => {
                tracing::error!(error = %err, "Password hashing error");
                internal()
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                "rate limit exceeded".to_string(),
            ),
        };

        let body = match fields {
            Some(fields) => json!({ "error": message, "code": code, "fields": fields }),
            None => json!({ "error": message, "code": code }),
        };

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn store_errors_map_to_http_statuses() {
        assert_eq!(status_of(StoreError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(status_of(StoreError::UpdateConflict.into()), StatusCode::CONFLICT);
        assert_eq!(
            status_of(StoreError::DuplicateEmail.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(StoreError::Timeout(Duration::from_secs(3)).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(StoreError::Database(sqlx::Error::PoolTimedOut).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn core_errors_map_to_http_statuses() {
        assert_eq!(
            status_of(AppError::field("title", "must be provided")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(AppError::forbidden("no")), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(CoreError::Internal("boom".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limited_is_429() {
        assert_eq!(status_of(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn unauthorized_sets_www_authenticate() {
        let response = AppError::unauthorized("invalid or missing authentication token").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    }
}
