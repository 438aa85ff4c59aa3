//! SMTP mail delivery.
//!
//! [`Mailer`] wraps the `lettre` async SMTP transport. Configuration is
//! loaded from environment variables; when `SMTP_HOST` is not set
//! [`MailConfig::from_env`] returns `None` and [`Mailer::disabled`] should be
//! used instead, which renders every message and logs it without sending.

use std::future::Future;
use std::time::Duration;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::Value;

use crate::templates::Template;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),

    /// The payload lacks a value the template needs.
    #[error("Template {template} requires payload field {field}")]
    MissingField {
        template: &'static str,
        field: &'static str,
    },
}

// ---------------------------------------------------------------------------
// MailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port.
const DEFAULT_SMTP_PORT: u16 = 2525;

/// Default sender when `SMTP_SENDER` is not set.
const DEFAULT_SENDER: &str = "Marquee <no-reply@marquee.local>";

/// Per-attempt dial/send timeout.
const SMTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivery attempts per message.
pub const MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// RFC 5322 "From" mailbox, e.g. `Marquee <no-reply@marquee.local>`.
    pub sender: String,
}

impl MailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                            |
    /// |-----------------|----------|------------------------------------|
    /// | `SMTP_HOST`     | yes      | --                                 |
    /// | `SMTP_PORT`     | no       | `2525`                             |
    /// | `SMTP_USERNAME` | no       | --                                 |
    /// | `SMTP_PASSWORD` | no       | --                                 |
    /// | `SMTP_SENDER`   | no       | `Marquee <no-reply@marquee.local>` |
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            sender: std::env::var("SMTP_SENDER").unwrap_or_else(|_| DEFAULT_SENDER.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// Renders templates and sends them. Cheap to clone.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    sender: String,
}

impl Mailer {
    /// Build an SMTP-backed mailer. The connection is opened lazily on the
    /// first send.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .timeout(Some(SMTP_TIMEOUT));

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        config.sender.parse::<Mailbox>()?;

        Ok(Self {
            transport: Some(builder.build()),
            sender: config.sender.clone(),
        })
    }

    /// A mailer that renders and logs messages without sending them.
    pub fn disabled() -> Self {
        Self {
            transport: None,
            sender: DEFAULT_SENDER.to_string(),
        }
    }

    /// SMTP-backed when `config` is present, disabled otherwise.
    pub fn from_config(config: Option<&MailConfig>) -> Result<Self, MailError> {
        match config {
            Some(config) => Self::new(config),
            None => Ok(Self::disabled()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Render `template` with `payload` and deliver it to `recipient`,
    /// retrying up to [`MAX_ATTEMPTS`] times.
    pub async fn send(
        &self,
        recipient: &str,
        template: Template,
        payload: &Value,
    ) -> Result<(), MailError> {
        let rendered = template.render(payload)?;

        let message = Message::builder()
            .from(self.sender.parse()?)
            .to(recipient.parse()?)
            .subject(rendered.subject)
            .multipart(MultiPart::alternative_plain_html(
                rendered.plain_body,
                rendered.html_body,
            ))?;

        let Some(transport) = &self.transport else {
            tracing::info!(
                to = recipient,
                template = template.id(),
                "Mail delivery disabled, message not sent"
            );
            return Ok(());
        };

        retry_fixed(MAX_ATTEMPTS, RETRY_DELAY, move || {
            let message = message.clone();
            async move { transport.send(message).await.map(|_| ()) }
        })
        .await?;

        tracing::info!(to = recipient, template = template.id(), "Email sent");
        Ok(())
    }
}

/// Run `op` up to `attempts` times, sleeping `delay` between failures.
/// Returns the last error if every attempt fails.
pub async fn retry_fixed<T, E, F, Fut>(attempts: u32, delay: Duration, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!(attempt, error = %e, "Mail delivery attempt failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(MailConfig::from_env().is_none());
    }

    #[test]
    fn mail_error_display_address() {
        let addr_err: Result<lettre::Address, _> = "not-an-email".parse();
        let err = MailError::Address(addr_err.unwrap_err());
        assert!(err.to_string().contains("Email address parse error"));
    }

    #[tokio::test]
    async fn disabled_mailer_renders_without_sending() {
        let mailer = Mailer::disabled();
        assert!(!mailer.is_enabled());

        let payload = json!({ "activationToken": "ABCDEFGHIJKLMNOPQRSTUVWXYZ", "userID": 1 });
        mailer
            .send("alice@example.com", Template::UserWelcome, &payload)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn bad_recipient_is_rejected_before_delivery() {
        let payload = json!({ "activationToken": "ABCDEFGHIJKLMNOPQRSTUVWXYZ" });
        let result = Mailer::disabled()
            .send("not-an-email", Template::TokenActivation, &payload)
            .await;
        assert_matches!(result, Err(MailError::Address(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), String> = retry_fixed(MAX_ATTEMPTS, RETRY_DELAY, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("connection refused".to_string()) }
        })
        .await;

        assert_eq!(result, Err("connection refused".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), RETRY_DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_on_first_success() {
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = retry_fixed(MAX_ATTEMPTS, RETRY_DELAY, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 2 {
                    Err("busy".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
