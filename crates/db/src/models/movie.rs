//! Movie entity model and DTOs.

use marquee_core::movies::Runtime;
use marquee_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `movies` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Movie {
    pub id: DbId,
    #[serde(skip_serializing)]
    pub created_at: Timestamp,
    pub title: String,
    pub year: i32,
    #[sqlx(try_from = "i32")]
    pub runtime: Runtime,
    pub genres: Vec<String>,
    /// Optimistic-concurrency counter, starts at 1.
    pub version: i32,
}

/// DTO for creating a new movie.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

/// DTO for a partial movie update. Only present fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMovie {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl UpdateMovie {
    /// Apply the present fields onto `movie`, leaving its version untouched.
    pub fn apply_to(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
    }
}
