//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_returns_ok_with_json(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/v1/healthcheck").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "available");
    assert_eq!(json["environment"], "development");
    assert!(json["version"].is_string());
    assert_eq!(json["db_healthy"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_route_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn response_contains_x_request_id_header(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/v1/healthcheck").await;

    let request_id = response.headers().get("x-request-id");
    assert!(
        request_id.is_some(),
        "Response must contain an x-request-id header"
    );
    assert_eq!(request_id.unwrap().to_str().unwrap().len(), 36);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn debug_vars_expose_version_and_pool_stats(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/v1/debug/vars").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["database"]["max_connections"].as_u64().unwrap() > 0);
    assert!(json["database"]["open_connections"].is_u64());
    assert!(json["database"]["idle_connections"].is_u64());
    assert_eq!(json["background_tasks"], 0);
    assert!(json["rate_limited_clients"].is_null());
    assert!(json["timestamp"].as_i64().unwrap() > 0);
}
