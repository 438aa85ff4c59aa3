//! Filter and pagination resolution for list endpoints.
//!
//! Client-supplied `page`, `page_size` and `sort` values are turned into a
//! [`SortPlan`] whose ORDER BY column is always one of the resource's
//! `&'static` safelist entries. Client text never reaches the SQL string.

use serde::Serialize;

use crate::validator::{permitted_value, ValidationErrors, Validator};

/// Default page when `?page=` is absent.
pub const DEFAULT_PAGE: i64 = 1;

/// Default page size when `?page_size=` is absent.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest accepted page number.
pub const MAX_PAGE: i64 = 10_000_000;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Sort keys accepted by the movie list endpoint. A `-` prefix sorts
/// descending.
pub const MOVIE_SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

/// Raw pagination and sort request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort: "id".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Resolved, injection-safe query plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortPlan {
    /// Column name borrowed from the safelist.
    pub column: &'static str,
    pub direction: SortDirection,
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Record every filter problem on `v`.
pub fn validate_filters(v: &mut Validator, filters: &Filters, safelist: &[&'static str]) {
    v.check(filters.page > 0, "page", "must be greater than zero");
    v.check(
        filters.page <= MAX_PAGE,
        "page",
        "must be a maximum of 10 million",
    );
    v.check(filters.page_size > 0, "page_size", "must be greater than zero");
    v.check(
        filters.page_size <= MAX_PAGE_SIZE,
        "page_size",
        "must be a maximum of 100",
    );
    v.check(
        permitted_value(&filters.sort.as_str(), safelist),
        "sort",
        "invalid sort value",
    );
}

impl Filters {
    /// Resolve into a [`SortPlan`], failing with every validation failure
    /// when a value is out of range or the sort key is not in `safelist`.
    pub fn plan(&self, safelist: &[&'static str]) -> Result<SortPlan, ValidationErrors> {
        let mut v = Validator::new();
        validate_filters(&mut v, self, safelist);

        // The returned column is the safelist's own string, not the input.
        let key = safelist
            .iter()
            .copied()
            .find(|candidate| *candidate == self.sort);
        let Some(key) = key.filter(|_| v.valid()) else {
            return Err(v.into_errors());
        };

        let (column, direction) = match key.strip_prefix('-') {
            Some(column) => (column, SortDirection::Desc),
            None => (key, SortDirection::Asc),
        };

        Ok(SortPlan {
            column,
            direction,
            page: self.page,
            limit: self.page_size,
            offset: (self.page - 1) * self.page_size,
        })
    }
}

/// Pagination summary returned alongside a page of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Metadata {
    /// Compute metadata from the total matching row count. All fields are
    /// zero when nothing matched.
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 || page_size <= 0 {
            return Self::default();
        }

        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}
