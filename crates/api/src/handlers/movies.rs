//! Handlers for the `/movies` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use marquee_core::filters::MOVIE_SORT_SAFELIST;
use marquee_core::movies::validate_movie;
use marquee_core::validator::Validator;
use marquee_db::models::movie::{CreateMovie, Movie, UpdateMovie};
use marquee_db::repositories::MovieRepo;
use marquee_db::StoreError;

use super::parse_id;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireMoviesRead, RequireMoviesWrite};
use crate::query::ListParams;
use crate::response::{DataResponse, MessageResponse, PaginatedResponse};
use crate::state::AppState;

/// Optional precondition header for partial updates.
pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

fn check_movie(title: &str, year: i32, runtime: i32, genres: &[String]) -> AppResult<()> {
    let mut v = Validator::new();
    validate_movie(&mut v, title, year, runtime, genres);
    if !v.valid() {
        return Err(v.into_errors().into());
    }
    Ok(())
}

/// GET /v1/movies
///
/// Filtered, sorted, paginated listing.
pub async fn list_movies(
    RequireMoviesRead(_user): RequireMoviesRead,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<PaginatedResponse<Movie>>> {
    let query = params.resolve(MOVIE_SORT_SAFELIST)?;

    let (movies, metadata) =
        MovieRepo::get_all(&state.pool, &query.title, &query.genres, &query.plan).await?;

    Ok(Json(PaginatedResponse {
        data: movies,
        metadata,
    }))
}

/// POST /v1/movies
pub async fn create_movie(
    RequireMoviesWrite(user): RequireMoviesWrite,
    State(state): State<AppState>,
    body: Result<Json<CreateMovie>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    check_movie(&input.title, input.year, input.runtime.minutes(), &input.genres)?;

    let movie = MovieRepo::insert(&state.pool, &input).await?;
    tracing::info!(movie_id = movie.id, user_id = user.id, "Movie created");

    let location = format!("/v1/movies/{}", movie.id);
    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(DataResponse { data: movie }),
    ))
}

/// GET /v1/movies/{id}
pub async fn get_movie(
    RequireMoviesRead(_user): RequireMoviesRead,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<DataResponse<Movie>>> {
    let id = parse_id(&raw_id, "movie")?;
    let movie = MovieRepo::get(&state.pool, id).await?;
    Ok(Json(DataResponse { data: movie }))
}

/// PATCH /v1/movies/{id}
///
/// Applies only the fields present in the body. When `X-Expected-Version` is
/// sent it must equal the stored version; the write itself is conditional on
/// the version read here either way.
pub async fn update_movie(
    RequireMoviesWrite(user): RequireMoviesWrite,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<UpdateMovie>, JsonRejection>,
) -> AppResult<Json<DataResponse<Movie>>> {
    let id = parse_id(&raw_id, "movie")?;
    let Json(input) = body?;

    let mut movie = MovieRepo::get(&state.pool, id).await?;

    if let Some(expected) = expected_version(&headers)? {
        if expected != movie.version {
            return Err(StoreError::UpdateConflict.into());
        }
    }

    input.apply_to(&mut movie);
    check_movie(&movie.title, movie.year, movie.runtime.minutes(), &movie.genres)?;

    movie.version = MovieRepo::update(&state.pool, &movie).await?;
    tracing::info!(movie_id = movie.id, version = movie.version, user_id = user.id, "Movie updated");

    Ok(Json(DataResponse { data: movie }))
}

/// DELETE /v1/movies/{id}
pub async fn delete_movie(
    RequireMoviesWrite(user): RequireMoviesWrite,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&raw_id, "movie")?;
    MovieRepo::delete(&state.pool, id).await?;
    tracing::info!(movie_id = id, user_id = user.id, "Movie deleted");
    Ok(Json(MessageResponse::new("movie successfully deleted")))
}

fn expected_version(headers: &HeaderMap) -> AppResult<Option<i32>> {
    let Some(value) = headers.get(EXPECTED_VERSION_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .map(Some)
        .ok_or_else(|| AppError::BadRequest("X-Expected-Version must be an integer".into()))
}
