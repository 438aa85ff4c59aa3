//! Permission codes and membership checks.

use serde::Serialize;

/// Read access to the movie catalog.
pub const MOVIES_READ: &str = "movies:read";

/// Write access to the movie catalog.
pub const MOVIES_WRITE: &str = "movies:write";

/// The set of permission codes granted to one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permissions(pub Vec<String>);

impl Permissions {
    /// Linear membership test; grant sets are small.
    pub fn include(&self, code: &str) -> bool {
        self.0.iter().any(|held| held == code)
    }
}

impl FromIterator<String> for Permissions {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_checks_membership() {
        let perms: Permissions = vec![MOVIES_READ.to_string()].into_iter().collect();
        assert!(perms.include(MOVIES_READ));
        assert!(!perms.include(MOVIES_WRITE));
        assert!(!Permissions::default().include(MOVIES_READ));
    }
}
