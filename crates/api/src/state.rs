use std::sync::Arc;

use marquee_events::Mailer;
use tokio_util::task::TaskTracker;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::ClientLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: marquee_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Outbound mail; disabled when SMTP is not configured.
    pub mailer: Mailer,
    /// Tracks background mail tasks so shutdown can drain them.
    pub tasks: TaskTracker,
    /// Per-client limiter; `None` when rate limiting is disabled.
    pub limiter: Option<Arc<ClientLimiter>>,
}
