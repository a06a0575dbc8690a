//! User directory cache
//!
//! Holds the full roster, the current filter criteria and the filtered view
//! shown in the "start new chat" dropdown.

use std::collections::BTreeMap;

use chat_core::filter::{filter_users, RoleFilter};
use chat_core::User;

/// Roster plus filtered view
#[derive(Debug, Clone, Default)]
pub struct UserDirectoryCache {
    roster: Vec<User>,
    filtered: Vec<User>,
    role_filter: RoleFilter,
    search_query: String,
    loaded: bool,
    revision: u64,
}

impl UserDirectoryCache {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole roster
    pub fn replace_roster(&mut self, roster: Vec<User>) {
        self.roster = roster;
        self.loaded = true;
    }

    /// Drop the roster after a failed load
    pub fn clear(&mut self) {
        self.roster.clear();
        self.filtered.clear();
        self.loaded = false;
        self.revision += 1;
    }

    /// Full roster, including the current user if the server sent it
    pub fn roster(&self) -> &[User] {
        &self.roster
    }

    /// Filtered view from the last evaluation
    pub fn filtered(&self) -> &[User] {
        &self.filtered
    }

    /// Whether a roster load has succeeded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of filter evaluations so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Current search text, untrimmed
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Current role filter
    pub fn role_filter(&self) -> &RoleFilter {
        &self.role_filter
    }

    /// Update the search text without re-filtering
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// Update the role filter without re-filtering
    pub fn set_role_filter(&mut self, filter: RoleFilter) {
        self.role_filter = filter;
    }

    /// Whether the search text is non-blank
    pub fn has_query(&self) -> bool {
        !self.search_query.trim().is_empty()
    }

    /// Recompute the filtered view from the roster and current criteria
    pub fn apply_filter(&mut self, current_user_id: Option<&str>) -> usize {
        self.filtered = filter_users(
            &self.roster,
            current_user_id,
            &self.role_filter,
            &self.search_query,
        );
        self.revision += 1;
        self.filtered.len()
    }

    /// Look up a roster entry by ID
    pub fn find(&self, user_id: &str) -> Option<&User> {
        self.roster.iter().find(|u| u.id == user_id)
    }

    /// Whether `user_id` is in the roster
    pub fn contains(&self, user_id: &str) -> bool {
        self.find(user_id).is_some()
    }

    /// Roster size per lowercased role
    pub fn role_breakdown(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for user in &self.roster {
            *counts.entry(user.role.to_lowercase()).or_insert(0) += 1;
        }
        counts
    }

    /// Hint shown when the filtered view is empty
    pub fn empty_hint(&self) -> String {
        let query = self.search_query.trim();
        if query.is_empty() {
            "No users found".to_string()
        } else {
            format!("No users found for \"{}\"", query)
        }
    }
}
