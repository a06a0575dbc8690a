//! Directory filtering
//!
//! Filtering runs entirely against the already-loaded roster. It never issues a
//! network call and is cheap enough to run on every keystroke.

use std::fmt;
use std::str::FromStr;

use crate::users::{Role, User};

/// Role criterion for the directory
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoleFilter {
    /// No role restriction
    #[default]
    All,
    /// Keep users whose role equals this value, ignoring case
    Only(String),
}

impl RoleFilter {
    /// Parse a filter chip value; "all" in any casing means no restriction
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            RoleFilter::All
        } else {
            RoleFilter::Only(value.to_lowercase())
        }
    }

    /// Filter chips in display order, starting with "all"
    pub fn choices() -> Vec<RoleFilter> {
        std::iter::once(RoleFilter::All)
            .chain(Role::FILTERABLE.iter().map(|r| RoleFilter::Only(r.as_str().to_string())))
            .collect()
    }

    /// Whether `user` passes this filter
    pub fn accepts(&self, user: &User) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Only(role) => user.has_role(role),
        }
    }

    /// Chip value, lowercase
    pub fn as_str(&self) -> &str {
        match self {
            RoleFilter::All => "all",
            RoleFilter::Only(role) => role,
        }
    }
}

impl fmt::Display for RoleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RoleFilter::parse(s))
    }
}

impl From<Role> for RoleFilter {
    fn from(role: Role) -> Self {
        RoleFilter::Only(role.as_str().to_string())
    }
}

/// Whether `user` matches a search query
///
/// `query` must already be trimmed and lowercased. The query is matched as a
/// substring of the name, the full email, the email local part and the
/// department. Users carry no phone number, so phone searches never match.
pub fn matches_query(user: &User, query: &str) -> bool {
    user.name.to_lowercase().contains(query)
        || user.email.to_lowercase().contains(query)
        || user.email_local_part().to_lowercase().contains(query)
        || user
            .department
            .as_ref()
            .is_some_and(|d| d.to_lowercase().contains(query))
}

/// Filter the roster for the directory dropdown
///
/// Removes the current user, applies the role filter and then the search
/// query. Roster order is preserved. When `current_user_id` is `None` nobody
/// is excluded.
pub fn filter_users(
    roster: &[User],
    current_user_id: Option<&str>,
    role_filter: &RoleFilter,
    search_query: &str,
) -> Vec<User> {
    let query = search_query.trim().to_lowercase();

    roster
        .iter()
        .filter(|user| current_user_id != Some(user.id.as_str()))
        .filter(|user| role_filter.accepts(user))
        .filter(|user| query.is_empty() || matches_query(user, &query))
        .cloned()
        .collect()
}
