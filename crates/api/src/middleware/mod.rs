//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Resolves the user behind an authentication-scope
//!   Bearer token.
//! - [`rbac::RequireActivated`] -- Requires an activated account.
//! - [`rbac::RequireMoviesRead`] / [`rbac::RequireMoviesWrite`] -- Require
//!   an activated account holding the matching permission.
//! - [`rate_limit::rate_limit`] -- Per-client token bucket, 429 when empty.

pub mod auth;
pub mod rate_limit;
pub mod rbac;
