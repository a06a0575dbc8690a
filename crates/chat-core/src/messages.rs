//! Direct messages and conversations
//!
//! This module defines the message and conversation records exchanged with the
//! chat backend, plus the outgoing-message validation and conversation preview
//! helpers used by the sidebar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

use crate::display::format_relative_time;
use crate::users::User;

/// Errors raised while preparing an outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Message is empty after trimming whitespace
    #[error("Message is empty")]
    Empty,

    /// Message too long
    #[error("Message too long: {length} exceeds maximum {max}")]
    TooLong {
        /// Actual message length in characters
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
}

/// Result type for message operations
pub type Result<T> = std::result::Result<T, MessageError>;

/// Default maximum message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Default number of graphemes shown in a conversation preview
pub const DEFAULT_PREVIEW_LENGTH: usize = 100;

/// Preview text for a conversation with no messages
pub const EMPTY_PREVIEW: &str = "No messages yet";

/// Unread count above which a sidebar row shows "9+"
pub const ROW_BADGE_CAP: u32 = 9;

/// A direct message between two users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned message ID
    pub id: String,
    /// ID of the sender
    pub sender_id: String,
    /// Display name of the sender
    pub sender_name: String,
    /// ID of the receiver
    pub receiver_id: String,
    /// Display name of the receiver
    pub receiver_name: String,
    /// Message text
    pub message: String,
    /// Server-assigned timestamp
    pub timestamp: DateTime<Utc>,
    /// Whether the receiver has read the message
    #[serde(default)]
    pub read: bool,
}

impl Message {
    /// Whether this message was sent by `user_id`
    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }

    /// Whether this message belongs to the thread between `user_id` and `counterpart_id`
    pub fn involves(&self, user_id: &str, counterpart_id: &str) -> bool {
        (self.sender_id == user_id && self.receiver_id == counterpart_id)
            || (self.sender_id == counterpart_id && self.receiver_id == user_id)
    }
}

/// Check an outgoing message and return the text to send
///
/// Leading and trailing whitespace is stripped. Length is counted in
/// characters, not bytes.
pub fn prepare_outgoing(text: &str, max_length: usize) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MessageError::Empty);
    }

    let length = trimmed.chars().count();
    if length > max_length {
        return Err(MessageError::TooLong { length, max: max_length });
    }

    Ok(trimmed)
}

/// A one-to-one conversation summary
///
/// The server keeps one conversation per counterpart; the client only ever
/// reads snapshots of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// The counterpart
    pub user: User,
    /// Most recent message, if any
    #[serde(default)]
    pub last_message: Option<Message>,
    /// Messages from the counterpart not yet read
    #[serde(default)]
    pub unread_count: u32,
}

impl Conversation {
    /// Create a conversation with no messages
    pub fn new(user: User) -> Self {
        Self { user, last_message: None, unread_count: 0 }
    }

    /// ID of the counterpart, which keys the conversation
    pub fn counterpart_id(&self) -> &str {
        &self.user.id
    }

    /// Check if this conversation has unread messages
    pub fn has_unread(&self) -> bool {
        self.unread_count > 0
    }

    /// Mark conversation as read
    pub fn mark_read(&mut self) {
        self.unread_count = 0;
    }

    /// Timestamp of the latest message
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|m| m.timestamp)
    }
}

/// Sidebar row for a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationPreview {
    /// Counterpart ID
    pub counterpart_id: String,
    /// Counterpart name
    pub title: String,
    /// Counterpart role as reported by the server
    pub role: String,
    /// Last message text, truncated, or the empty-state text
    pub preview_text: String,
    /// Relative time of the last message, empty when there is none
    pub relative_time: String,
    /// Unread count
    pub unread_count: u32,
}

impl ConversationPreview {
    /// Build a preview, truncating the last message to `max_graphemes`
    pub fn from_conversation(conversation: &Conversation, max_graphemes: usize) -> Self {
        let (preview_text, relative_time) = match &conversation.last_message {
            Some(last) => (
                truncate_graphemes(&last.message, max_graphemes),
                format_relative_time(&last.timestamp),
            ),
            None => (EMPTY_PREVIEW.to_string(), String::new()),
        };

        Self {
            counterpart_id: conversation.user.id.clone(),
            title: conversation.user.name.clone(),
            role: conversation.user.role.clone(),
            preview_text,
            relative_time,
            unread_count: conversation.unread_count,
        }
    }

    /// Check if there are unread messages
    pub fn has_unread(&self) -> bool {
        self.unread_count > 0
    }

    /// Row badge text: the count, "9+" above the cap, nothing when read
    pub fn unread_label(&self) -> Option<String> {
        match self.unread_count {
            0 => None,
            n if n > ROW_BADGE_CAP => Some(format!("{}+", ROW_BADGE_CAP)),
            n => Some(n.to_string()),
        }
    }
}

fn truncate_graphemes(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
