//! Route definitions for the `/tokens` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::tokens;
use crate::state::AppState;

/// Routes mounted at `/tokens`.
///
/// ```text
/// POST /activation       -> create_activation_token
/// POST /authentication   -> create_authentication_token
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activation", post(tokens::create_activation_token))
        .route("/authentication", post(tokens::create_authentication_token))
}
