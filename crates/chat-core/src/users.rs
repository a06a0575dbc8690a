//! Directory users
//!
//! Users are the addressable members of the roster. The server owns them; the
//! client refreshes the whole roster on reload and never patches a single entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user that can be messaged
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Role as reported by the server (casing varies, e.g. "ALUMNI", "student")
    pub role: String,
    /// Department, when the server knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl User {
    /// Create a new user without a department
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role: role.into(),
            department: None,
        }
    }

    /// Set the department
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// The portion of the email before `@`, or the whole address if there is none
    pub fn email_local_part(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }

    /// The classified role of this user
    pub fn role_kind(&self) -> Role {
        Role::parse(&self.role)
    }

    /// Whether the role matches `role` ignoring case
    pub fn has_role(&self, role: &str) -> bool {
        self.role.to_lowercase() == role.to_lowercase()
    }
}

/// Known user roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Enrolled student
    Student,
    /// Faculty member
    Professor,
    /// Graduate of the institution
    Alumni,
    /// Administrative staff
    Management,
    /// Anything the client does not recognise
    Other,
}

impl Role {
    /// Roles offered as directory filter chips, in display order
    pub const FILTERABLE: [Role; 4] = [Role::Student, Role::Professor, Role::Alumni, Role::Management];

    /// Classify a role string, ignoring case and surrounding whitespace
    pub fn parse(role: &str) -> Self {
        match role.trim().to_lowercase().as_str() {
            "student" => Role::Student,
            "professor" => Role::Professor,
            "alumni" => Role::Alumni,
            "management" => Role::Management,
            _ => Role::Other,
        }
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Professor => "professor",
            Role::Alumni => "alumni",
            Role::Management => "management",
            Role::Other => "other",
        }
    }

    /// Capitalised label for filter chips
    pub fn label(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Professor => "Professor",
            Role::Alumni => "Alumni",
            Role::Management => "Management",
            Role::Other => "Other",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::parse(s))
    }
}
