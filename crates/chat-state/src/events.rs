//! Events broadcast to the presentation layer

use std::fmt;

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Confirmation of a completed action
    Success,
    /// Something failed and the user should know
    Error,
}

/// A transient user-visible notice (toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text to show
    pub message: String,
}

impl Notice {
    /// Create a success notice
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    /// Create an error notice
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }

    /// Create an error notice that carries the underlying failure
    pub fn failure(context: &str, cause: &impl fmt::Display) -> Self {
        Self::error(format!("{}: {}", context, cause))
    }

    /// Check if this is an error notice
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Events emitted by the chat controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Show a notice
    Notice(Notice),
    /// The active thread changed; scroll to the newest message
    ScrollToLatest {
        /// Counterpart whose thread changed
        counterpart_id: String,
        /// Messages now in the thread
        message_count: usize,
    },
    /// The conversation list was replaced
    ConversationsUpdated,
    /// The filtered directory was recomputed
    DirectoryFiltered {
        /// Users in the filtered view
        result_count: usize,
    },
    /// The selected counterpart changed
    SelectionChanged {
        /// New counterpart ID
        counterpart_id: String,
    },
}
