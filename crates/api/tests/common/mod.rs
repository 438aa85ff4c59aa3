#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use marquee_api::config::{Environment, LimiterConfig, ServerConfig};
use marquee_api::middleware::rate_limit::build_limiter;
use marquee_api::router::build_app_router;
use marquee_api::state::AppState;
use marquee_core::password::Password;
use marquee_core::tokens::SCOPE_AUTHENTICATION;
use marquee_db::models::user::{CreateUser, User};
use marquee_db::repositories::{PermissionRepo, TokenRepo, UserRepo};
use marquee_events::Mailer;
use sqlx::PgPool;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;

/// Password every helper-created user is registered with.
pub const TEST_PASSWORD: &str = "pa55word";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        env: Environment::Development,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        activation_token_ttl: Duration::from_secs(3 * 24 * 60 * 60),
        auth_token_ttl: Duration::from_secs(24 * 60 * 60),
        limiter: LimiterConfig {
            enabled: false,
            ..LimiterConfig::default()
        },
    }
}

/// Build the full application router, with mail delivery disabled, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Same as [`build_test_app`] with an explicit configuration.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer: Mailer::disabled(),
        tasks: TaskTracker::new(),
        limiter: build_limiter(&config.limiter),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, request(Method::PUT, uri, None, Some(body))).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, request(Method::PATCH, uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(token), None)).await
}

/// Send a raw (possibly malformed) JSON body.
pub async fn post_raw_auth(app: Router, uri: &str, raw: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(raw.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// Insert a user directly, bypassing the registration endpoint.
pub async fn create_user(pool: &PgPool, email: &str, activated: bool, permissions: &[&str]) -> User {
    let mut password = Password::default();
    password.set(TEST_PASSWORD).unwrap();
    password.forget_plaintext();

    let user = UserRepo::insert(
        pool,
        &CreateUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password,
            activated,
        },
    )
    .await
    .expect("user creation should succeed");

    if !permissions.is_empty() {
        PermissionRepo::add_for_user(pool, user.id, permissions)
            .await
            .expect("permission grant should succeed");
    }
    user
}

/// Issue an authentication token for `user_id` and return its plaintext.
pub async fn auth_token(pool: &PgPool, user_id: i64) -> String {
    TokenRepo::new_token(pool, user_id, Duration::from_secs(3600), SCOPE_AUTHENTICATION)
        .await
        .expect("token issue should succeed")
        .plaintext
}

/// An activated user holding `permissions`, plus a live bearer token.
pub async fn user_with_token(pool: &PgPool, email: &str, permissions: &[&str]) -> (User, String) {
    let user = create_user(pool, email, true, permissions).await;
    let token = auth_token(pool, user.id).await;
    (user, token)
}
