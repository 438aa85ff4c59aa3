use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Deployment environment reported by the health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Per-client request rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    pub enabled: bool,
    /// Sustained requests per second allowed for one client.
    pub rps: u32,
    /// Requests a client may make in a burst above `rps`.
    pub burst: u32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rps: 2,
            burst: 4,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `4000`).
    pub port: u16,
    pub env: Environment,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background mail tasks (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Lifetime of activation tokens.
    pub activation_token_ttl: Duration,
    /// Lifetime of authentication tokens.
    pub auth_token_ttl: Duration,
    pub limiter: LimiterConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `4000`                  |
    /// | `ENV`                       | `development`           |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                    |
    /// | `ACTIVATION_TOKEN_TTL_MINS` | `4320` (3 days)         |
    /// | `AUTH_TOKEN_TTL_HOURS`      | `24`                    |
    /// | `LIMITER_ENABLED`           | `true`                  |
    /// | `LIMITER_RPS`               | `2`                     |
    /// | `LIMITER_BURST`             | `4`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "4000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let env: Environment = std::env::var("ENV")
            .unwrap_or_else(|_| "development".into())
            .parse()
            .expect("ENV must be development, staging or production");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let activation_mins: u64 = std::env::var("ACTIVATION_TOKEN_TTL_MINS")
            .unwrap_or_else(|_| "4320".into())
            .parse()
            .expect("ACTIVATION_TOKEN_TTL_MINS must be a valid u64");

        let auth_hours: u64 = std::env::var("AUTH_TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "24".into())
            .parse()
            .expect("AUTH_TOKEN_TTL_HOURS must be a valid u64");

        let limiter = LimiterConfig {
            enabled: std::env::var("LIMITER_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .expect("LIMITER_ENABLED must be true or false"),
            rps: std::env::var("LIMITER_RPS")
                .unwrap_or_else(|_| "2".into())
                .parse()
                .expect("LIMITER_RPS must be a valid u32"),
            burst: std::env::var("LIMITER_BURST")
                .unwrap_or_else(|_| "4".into())
                .parse()
                .expect("LIMITER_BURST must be a valid u32"),
        };

        Self {
            host,
            port,
            env,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            activation_token_ttl: Duration::from_secs(activation_mins * 60),
            auth_token_ttl: Duration::from_secs(auth_hours * 60 * 60),
            limiter,
        }
    }
}
