use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Connection pool counters.
#[derive(Serialize)]
pub struct PoolStats {
    pub max_connections: u32,
    pub open_connections: u32,
    pub idle_connections: usize,
}

/// Runtime counters published at `/debug/vars`.
#[derive(Serialize)]
pub struct DebugVars {
    pub version: &'static str,
    pub database: PoolStats,
    /// Mail deliveries still in flight.
    pub background_tasks: usize,
    /// Clients currently tracked by the rate limiter; `null` when disabled.
    pub rate_limited_clients: Option<usize>,
    /// Unix seconds.
    pub timestamp: i64,
}

/// GET /v1/debug/vars -- process and connection pool counters.
async fn debug_vars(State(state): State<AppState>) -> Json<DebugVars> {
    Json(DebugVars {
        version: env!("CARGO_PKG_VERSION"),
        database: PoolStats {
            max_connections: state.pool.options().get_max_connections(),
            open_connections: state.pool.size(),
            idle_connections: state.pool.num_idle(),
        },
        background_tasks: state.tasks.len(),
        rate_limited_clients: state.limiter.as_ref().map(|limiter| limiter.len()),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/debug/vars", get(debug_vars))
}
