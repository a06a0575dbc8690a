//! Session context
//!
//! The signed-in identity is handed to the controller at construction instead
//! of being looked up from ambient storage.

use chat_core::User;

/// Identity of the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    current_user_id: Option<String>,
    current_user_name: Option<String>,
}

impl SessionContext {
    /// Context for a signed-in user
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { current_user_id: Some(user_id.into()), current_user_name: None }
    }

    /// Context built from a full user record
    pub fn for_user(user: &User) -> Self {
        Self {
            current_user_id: Some(user.id.clone()),
            current_user_name: Some(user.name.clone()),
        }
    }

    /// Context with no session; nothing is filtered out of the directory
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.current_user_name = Some(name.into());
        self
    }

    /// ID of the signed-in user
    pub fn current_user_id(&self) -> Option<&str> {
        self.current_user_id.as_deref()
    }

    /// Display name of the signed-in user
    pub fn current_user_name(&self) -> Option<&str> {
        self.current_user_name.as_deref()
    }

    /// Whether `user_id` is the signed-in user
    pub fn is_current_user(&self, user_id: &str) -> bool {
        self.current_user_id.as_deref() == Some(user_id)
    }
}
