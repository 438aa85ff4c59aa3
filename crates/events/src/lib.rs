//! Outbound notifications for Marquee.
//!
//! - [`Mailer`] renders a [`Template`] and delivers it over SMTP, retrying
//!   transient failures.
//! - [`spawn_mail`] runs a delivery on a tracked background task so the
//!   request that triggered it never waits on SMTP.

pub mod background;
pub mod mailer;
pub mod templates;

pub use background::spawn_mail;
pub use mailer::{MailConfig, MailError, Mailer};
pub use templates::{RenderedMail, Template};
