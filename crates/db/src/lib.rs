//! PostgreSQL persistence for the Marquee catalog.
//!
//! Repositories translate every storage-specific signal into [`StoreError`]
//! so callers above this crate never inspect `sqlx` error shapes.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod models;
pub mod repositories;

pub use error::{with_deadline, StorageSignal, StoreError};

pub type DbPool = sqlx::PgPool;

/// Default upper bound on pooled connections.
const DEFAULT_MAX_CONNECTIONS: u32 = 4;
/// Default idle connections kept warm.
const DEFAULT_MIN_CONNECTIONS: u32 = 0;
/// Default wait for a free connection before giving up.
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
/// Default idle time before a connection is closed.
const DEFAULT_MAX_IDLE_SECS: u64 = 30 * 60;
/// Default maximum connection lifetime.
const DEFAULT_MAX_LIFETIME_SECS: u64 = 60 * 60;

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl DbConfig {
    /// Pool settings for `url` with every bound at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_MAX_IDLE_SECS),
            max_lifetime: Duration::from_secs(DEFAULT_MAX_LIFETIME_SECS),
        }
    }

    /// Load pool settings from environment variables.
    ///
    /// | Env Var                   | Required | Default |
    /// |---------------------------|----------|---------|
    /// | `DATABASE_URL`            | **yes**  | --      |
    /// | `DB_MAX_CONNS`            | no       | `4`     |
    /// | `DB_MIN_CONNS`            | no       | `0`     |
    /// | `DB_ACQUIRE_TIMEOUT_SECS` | no       | `5`     |
    /// | `DB_MAX_IDLE_SECS`        | no       | `1800`  |
    /// | `DB_MAX_LIFETIME_SECS`    | no       | `3600`  |
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is not set or a numeric value does not parse.
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let mut config = Self::new(url);

        config.max_connections = env_or("DB_MAX_CONNS", config.max_connections);
        config.min_connections = env_or("DB_MIN_CONNS", config.min_connections);
        config.acquire_timeout = Duration::from_secs(env_or(
            "DB_ACQUIRE_TIMEOUT_SECS",
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        ));
        config.idle_timeout =
            Duration::from_secs(env_or("DB_MAX_IDLE_SECS", DEFAULT_MAX_IDLE_SECS));
        config.max_lifetime =
            Duration::from_secs(env_or("DB_MAX_LIFETIME_SECS", DEFAULT_MAX_LIFETIME_SECS));

        config
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number")),
        Err(_) => default,
    }
}

/// Create a bounded connection pool.
///
/// Acquisition blocks for at most `acquire_timeout` when every connection is
/// in use; the pool never grows past `max_connections`.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .connect(&config.url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
