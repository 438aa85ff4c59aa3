use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use marquee_api::config::ServerConfig;
use marquee_api::middleware::rate_limit::{build_limiter, spawn_sweeper};
use marquee_api::router::build_app_router;
use marquee_api::state::AppState;
use marquee_db::DbConfig;
use marquee_events::{MailConfig, Mailer};
use tokio_util::task::TaskTracker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, env = %config.env, "Loaded server configuration");

    // --- Database ---
    let db_config = DbConfig::from_env();
    let pool = marquee_db::create_pool(&db_config)
        .await
        .expect("Failed to connect to database");
    tracing::info!(max_connections = db_config.max_connections, "Database connection pool created");

    marquee_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    marquee_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Mail ---
    let mail_config = MailConfig::from_env();
    let mailer = Mailer::from_config(mail_config.as_ref()).expect("Invalid SMTP configuration");
    if mailer.is_enabled() {
        tracing::info!("SMTP mail delivery enabled");
    } else {
        tracing::warn!("SMTP_HOST not set, outgoing mail will only be logged");
    }

    // --- Rate limiting ---
    let limiter = build_limiter(&config.limiter);
    let sweeper = limiter.clone().map(spawn_sweeper);
    if config.limiter.enabled {
        tracing::info!(rps = config.limiter.rps, burst = config.limiter.burst, "Rate limiter enabled");
    } else {
        tracing::warn!("Rate limiter disabled");
    }

    // --- App state ---
    let tasks = TaskTracker::new();
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        mailer,
        tasks: tasks.clone(),
        limiter,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    tracing::info!(pending = tasks.len(), "Server stopped accepting connections, draining background tasks");

    tasks.close();
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain, tasks.wait()).await.is_err() {
        tracing::warn!(pending = tasks.len(), "Background tasks still running at shutdown deadline");
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Human-readable output by default, JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marquee_api=debug,marquee_db=debug,marquee_events=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
