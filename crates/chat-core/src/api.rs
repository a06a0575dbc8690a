//! Chat backend contract
//!
//! The transport is supplied by the host application. This module only fixes
//! the operations the chat state layer needs and the errors they may report.

use async_trait::async_trait;
use thiserror::Error;

use crate::activity::ActivityCategory;
use crate::messages::{Conversation, Message};
use crate::users::User;

/// Errors reported by a chat backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Request could not be delivered
    #[error("Network error: {0}")]
    Network(String),

    /// API error with status code and message
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message from server
        message: String,
    },

    /// Session missing or expired
    #[error("Not authorized")]
    Unauthorized,

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Operations the chat controller requires from the backend
///
/// Implementations must be safe to call concurrently; the controller issues
/// the conversation and roster loads at the same time.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// List the current user's conversations
    async fn fetch_conversations(&self) -> Result<Vec<Conversation>>;

    /// List every user that can be messaged
    async fn fetch_roster(&self) -> Result<Vec<User>>;

    /// Message history with `counterpart_id`, oldest first
    async fn fetch_history(&self, counterpart_id: &str) -> Result<Vec<Message>>;

    /// Send `text` to `counterpart_id` and return the persisted message
    async fn send_message(&self, counterpart_id: &str, text: &str) -> Result<Message>;

    /// Mark every message from `counterpart_id` as read
    async fn mark_read(&self, counterpart_id: &str) -> Result<()>;

    /// Record an audit event
    async fn log_activity(&self, category: ActivityCategory, description: &str) -> Result<()>;
}
