//! Route definitions for the `/movies` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::movies;
use crate::state::AppState;

/// Routes mounted at `/movies`.
///
/// ```text
/// GET    /       -> list_movies
/// POST   /       -> create_movie
/// GET    /{id}   -> get_movie
/// PATCH  /{id}   -> update_movie
/// DELETE /{id}   -> delete_movie
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(movies::list_movies).post(movies::create_movie))
        .route(
            "/{id}",
            get(movies::get_movie)
                .patch(movies::update_movie)
                .delete(movies::delete_movie),
        )
}
