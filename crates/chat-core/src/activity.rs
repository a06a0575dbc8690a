//! Activity categories recorded after a message is sent

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::users::{Role, User};

/// Audit category for chat activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityCategory {
    /// Chat with an alumnus, and the fallback for every non-professor role
    AlumniChat,
    /// Chat with a professor
    ProfessorChat,
}

impl ActivityCategory {
    /// Category for a message sent to `counterpart`
    pub fn for_counterpart(counterpart: &User) -> Self {
        match counterpart.role_kind() {
            Role::Professor => ActivityCategory::ProfessorChat,
            _ => ActivityCategory::AlumniChat,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityCategory::AlumniChat => "ALUMNI_CHAT",
            ActivityCategory::ProfessorChat => "PROFESSOR_CHAT",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text description logged alongside the category
pub fn sent_message_description(counterpart: &User) -> String {
    format!("Sent message to {}", counterpart.name)
}
