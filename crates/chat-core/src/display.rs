//! Presentation helpers for timestamps and roles

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use std::fmt;

use crate::users::Role;

/// Format a timestamp relative to now, in the local time zone
///
/// See [`format_relative_time_at`] for the rules.
pub fn format_relative_time(timestamp: &DateTime<Utc>) -> String {
    format_relative_time_at(timestamp, &Utc::now(), &Local)
}

/// Format a timestamp relative to `now`, rendered in `tz`
///
/// - younger than 24 hours: clock time (`14:05`)
/// - younger than 7 days: short weekday (`Tue`)
/// - otherwise: month and day (`Mar 5`)
///
/// Timestamps in the future count as younger than 24 hours.
pub fn format_relative_time_at<Tz>(timestamp: &DateTime<Utc>, now: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let age = now.signed_duration_since(*timestamp);
    let local = timestamp.with_timezone(tz);

    if age < Duration::hours(24) {
        local.format("%H:%M").to_string()
    } else if age < Duration::hours(24 * 7) {
        local.format("%a").to_string()
    } else {
        local.format("%b %-d").to_string()
    }
}

/// Colour category used to badge a user's role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleCategory {
    /// Students
    Student,
    /// Professors
    Professor,
    /// Alumni
    Alumni,
    /// Management staff
    Management,
    /// Unknown roles
    Neutral,
}

impl RoleCategory {
    /// Palette colour name for this category
    pub fn color(&self) -> &'static str {
        match self {
            RoleCategory::Student => "blue",
            RoleCategory::Professor => "green",
            RoleCategory::Alumni => "purple",
            RoleCategory::Management => "red",
            RoleCategory::Neutral => "gray",
        }
    }
}

/// Map a role string to its colour category, ignoring case
///
/// Unrecognised roles fall back to [`RoleCategory::Neutral`].
pub fn classify_role(role: &str) -> RoleCategory {
    match Role::parse(role) {
        Role::Student => RoleCategory::Student,
        Role::Professor => RoleCategory::Professor,
        Role::Alumni => RoleCategory::Alumni,
        Role::Management => RoleCategory::Management,
        Role::Other => RoleCategory::Neutral,
    }
}
