//! Per-client rate limiting through the full middleware stack.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use marquee_api::config::LimiterConfig;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_requests_beyond_burst_get_429(pool: PgPool) {
    let mut config = common::test_config();
    config.limiter = LimiterConfig {
        enabled: true,
        rps: 1,
        burst: 4,
    };
    // One router, so every request draws from the same bucket.
    let app = common::build_test_app_with(pool, config);

    for attempt in 1..=4 {
        let response = get(app.clone(), "/v1/healthcheck").await;
        assert_eq!(response.status(), StatusCode::OK, "request {attempt} is within the burst");
    }

    let response = get(app.clone(), "/v1/healthcheck").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("x-request-id"));

    let json = body_json(response).await;
    assert_eq!(json["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(json["error"], "rate limit exceeded");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_disabled_limiter_never_rejects(pool: PgPool) {
    let app = common::build_test_app(pool);

    for _ in 0..10 {
        let response = get(app.clone(), "/v1/healthcheck").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_debug_vars_report_tracked_clients(pool: PgPool) {
    let mut config = common::test_config();
    config.limiter.enabled = true;
    let app = common::build_test_app_with(pool, config);

    let response = get(app, "/v1/debug/vars").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["rate_limited_clients"], 1);
}
