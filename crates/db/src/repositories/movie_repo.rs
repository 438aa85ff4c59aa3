//! Repository for the `movies` table.

use std::time::Duration;

use marquee_core::filters::{Metadata, SortPlan};
use marquee_core::types::DbId;
use sqlx::{FromRow, PgPool};

use crate::error::{with_deadline, StoreError};
use crate::models::movie::{CreateMovie, Movie};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, created_at, title, year, runtime, genres, version";

/// Per-call deadline for movie queries.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// A movie row paired with the window count of all matching rows.
#[derive(FromRow)]
struct CountedMovie {
    total_records: i64,
    #[sqlx(flatten)]
    movie: Movie,
}

/// Provides CRUD operations for movies.
pub struct MovieRepo;

impl MovieRepo {
    /// Insert a new movie. The database assigns `id`, `created_at` and
    /// `version = 1`.
    pub async fn insert(pool: &PgPool, input: &CreateMovie) -> Result<Movie, StoreError> {
        let query = format!(
            "INSERT INTO movies (title, year, runtime, genres)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        with_deadline(
            QUERY_TIMEOUT,
            sqlx::query_as::<_, Movie>(&query)
                .bind(&input.title)
                .bind(input.year)
                .bind(input.runtime.minutes())
                .bind(&input.genres)
                .fetch_one(pool),
        )
        .await
    }

    /// Fetch a movie by ID.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Movie, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let query = format!("SELECT {COLUMNS} FROM movies WHERE id = $1");
        with_deadline(
            QUERY_TIMEOUT,
            sqlx::query_as::<_, Movie>(&query).bind(id).fetch_one(pool),
        )
        .await
    }

    /// Write every mutable field of `movie`, conditional on the row still
    /// being at `movie.version`.
    ///
    /// Returns the new version. If another writer got there first the row
    /// no longer matches and [`StoreError::UpdateConflict`] is returned.
    pub async fn update(pool: &PgPool, movie: &Movie) -> Result<i32, StoreError> {
        let version = with_deadline(
            QUERY_TIMEOUT,
            sqlx::query_scalar::<_, i32>(
                "UPDATE movies
                 SET title = $1, year = $2, runtime = $3, genres = $4, version = version + 1
                 WHERE id = $5 AND version = $6
                 RETURNING version",
            )
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime.minutes())
            .bind(&movie.genres)
            .bind(movie.id)
            .bind(movie.version)
            .fetch_optional(pool),
        )
        .await?;

        version.ok_or(StoreError::UpdateConflict)
    }

    /// Hard-delete a movie. Deleting a missing row is an error, not a no-op.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let result = with_deadline(
            QUERY_TIMEOUT,
            sqlx::query("DELETE FROM movies WHERE id = $1")
                .bind(id)
                .execute(pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// List one page of movies matching `title` (case-insensitive substring,
    /// empty matches all) and containing every tag in `genres` (empty
    /// matches all), ordered by `plan`.
    pub async fn get_all(
        pool: &PgPool,
        title: &str,
        genres: &[String],
        plan: &SortPlan,
    ) -> Result<(Vec<Movie>, Metadata), StoreError> {
        // `plan.column` is a safelist constant, never client text.
        let query = format!(
            "SELECT count(*) OVER() AS total_records, {COLUMNS}
             FROM movies
             WHERE (STRPOS(LOWER(title), LOWER($1)) > 0 OR $1 = '')
               AND (genres @> $2::text[] OR cardinality($2::text[]) = 0)
             ORDER BY {} {}, id ASC
             LIMIT $3 OFFSET $4",
            plan.column,
            plan.direction.as_sql(),
        );

        let rows = with_deadline(
            QUERY_TIMEOUT,
            sqlx::query_as::<_, CountedMovie>(&query)
                .bind(title)
                .bind(genres)
                .bind(plan.limit)
                .bind(plan.offset)
                .fetch_all(pool),
        )
        .await?;

        let total_records = rows.first().map_or(0, |row| row.total_records);
        let movies = rows.into_iter().map(|row| row.movie).collect();
        let metadata = Metadata::calculate(total_records, plan.page, plan.limit);

        Ok((movies, metadata))
    }
}
