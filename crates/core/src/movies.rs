//! Movie business rules: field validation and the runtime wire format.

use std::fmt;

use chrono::Datelike;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::validator::{unique, Validator};

/// Earliest release year accepted.
pub const MIN_YEAR: i32 = 1880;

/// Titles must be strictly shorter than this many bytes.
pub const MAX_TITLE_LEN: usize = 500;

/// Maximum number of genre tags on one movie.
pub const MAX_GENRES: usize = 5;

/// Validate every movie field, recording all failures on `v`.
pub fn validate_movie(v: &mut Validator, title: &str, year: i32, runtime: i32, genres: &[String]) {
    let current_year = chrono::Utc::now().year();

    v.check(!title.is_empty(), "title", "must be provided");
    v.check(
        title.len() < MAX_TITLE_LEN,
        "title",
        "must be less than 500 characters",
    );

    v.check(year >= MIN_YEAR, "year", "must be greater than 1879");
    v.check(year <= current_year, "year", "must not be in the future");

    v.check(runtime > 0, "runtime", "must be a positive integer");

    v.check(!genres.is_empty(), "genres", "must contain at least one genre");
    v.check(
        genres.len() <= MAX_GENRES,
        "genres",
        "must not contain more than 5 genres",
    );
    v.check(unique(genres), "genres", "must not contain duplicate values");
}

/// Movie runtime in minutes.
///
/// Serializes as `"<n> mins"`; deserializes from that string or a bare
/// integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Runtime(pub i32);

/// Malformed runtime string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid runtime format")]
pub struct InvalidRuntimeFormat;

impl Runtime {
    pub fn minutes(self) -> i32 {
        self.0
    }
}

impl From<i32> for Runtime {
    fn from(minutes: i32) -> Self {
        Runtime(minutes)
    }
}

impl std::str::FromStr for Runtime {
    type Err = InvalidRuntimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = s.strip_suffix(" mins").ok_or(InvalidRuntimeFormat)?;
        number
            .parse::<i32>()
            .map(Runtime)
            .map_err(|_| InvalidRuntimeFormat)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RuntimeVisitor;

        impl Visitor<'_> for RuntimeVisitor {
            type Value = Runtime;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer or a string of the form \"<n> mins\"")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Runtime, E> {
                i32::try_from(v)
                    .map(Runtime)
                    .map_err(|_| E::custom(InvalidRuntimeFormat))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Runtime, E> {
                i32::try_from(v)
                    .map(Runtime)
                    .map_err(|_| E::custom(InvalidRuntimeFormat))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Runtime, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(RuntimeVisitor)
    }
}
