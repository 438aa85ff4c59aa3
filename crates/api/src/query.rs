//! Query-string parsing for list endpoints.
//!
//! Every parameter arrives as an optional string so malformed integers are
//! reported as field failures alongside the range and sort checks, instead of
//! rejecting the whole request before validation runs.

use marquee_core::filters::{Filters, SortPlan, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use marquee_core::validator::{ValidationErrors, Validator};
use serde::Deserialize;

/// Raw `?title=&genres=&page=&page_size=&sort=` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub title: Option<String>,
    /// Comma-separated tags.
    pub genres: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

/// Parsed and validated list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub title: String,
    pub genres: Vec<String>,
    pub plan: SortPlan,
}

impl ListParams {
    /// Parse every parameter and resolve the sort plan against `safelist`,
    /// reporting parse and range failures together.
    pub fn resolve(self, safelist: &[&'static str]) -> Result<ListQuery, ValidationErrors> {
        let mut v = Validator::new();

        let filters = Filters {
            page: read_int(&mut v, "page", self.page.as_deref(), DEFAULT_PAGE),
            page_size: read_int(&mut v, "page_size", self.page_size.as_deref(), DEFAULT_PAGE_SIZE),
            sort: non_empty(self.sort).unwrap_or_else(|| "id".to_string()),
        };

        let plan = match filters.plan(safelist) {
            Ok(plan) if v.valid() => plan,
            Ok(_) => return Err(v.into_errors()),
            Err(errors) => {
                v.merge(errors);
                return Err(v.into_errors());
            }
        };

        Ok(ListQuery {
            title: self.title.unwrap_or_default(),
            genres: read_csv(self.genres.as_deref()),
            plan,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn read_int(v: &mut Validator, key: &str, raw: Option<&str>, default: i64) -> i64 {
    match raw {
        None | Some("") => default,
        Some(s) => s.parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
    }
}

fn read_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|csv| {
        csv.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
