pub mod debug;
pub mod health;
pub mod movies;
pub mod tokens;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /healthcheck                 service + database health (public)
/// /debug/vars                  version, pool and background task counters (public)
///
/// /movies                      list (movies:read), create (movies:write)
/// /movies/{id}                 get (movies:read), update, delete (movies:write)
///
/// /users                       register (public)
/// /users/activated             activate with token (public)
///
/// /tokens/activation           resend activation token (public)
/// /tokens/authentication       exchange credentials for a token (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(debug::router())
        .nest("/movies", movies::router())
        .nest("/users", users::router())
        .nest("/tokens", tokens::router())
}
