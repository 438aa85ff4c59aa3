//! Per-client rate limiting.
//!
//! Each client IP gets its own token bucket refilled at `rps` per second
//! and holding at most `burst` requests. Requests without a peer address
//! (in-process callers) share one bucket.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tokio::task::JoinHandle;

use crate::config::LimiterConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Keyed limiter shared by every request.
pub type ClientLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// How often idle client buckets are dropped.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Build the shared limiter, or `None` when limiting is disabled.
///
/// Zero `rps` or `burst` values are raised to one.
pub fn build_limiter(config: &LimiterConfig) -> Option<Arc<ClientLimiter>> {
    if !config.enabled {
        return None;
    }
    let rps = NonZeroU32::new(config.rps).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(config.burst).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::per_second(rps).allow_burst(burst);
    Some(Arc::new(RateLimiter::keyed(quota)))
}

/// Periodically forget clients whose buckets have refilled completely.
pub fn spawn_sweeper(limiter: Arc<ClientLimiter>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            limiter.retain_recent();
            limiter.shrink_to_fit();
            tracing::debug!(clients = limiter.len(), "Rate limiter swept");
        }
    })
}

fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Reject with 429 once the caller's bucket is empty.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(limiter) = &state.limiter {
        let ip = client_ip(&request);
        if limiter.check_key(&ip).is_err() {
            tracing::debug!(client = %ip, "Rate limit exceeded");
            return Err(AppError::RateLimited);
        }
    }
    Ok(next.run(request).await)
}
