//! Conversation list store
//!
//! Keeps the snapshot of conversations returned by the backend, one entry per
//! counterpart, along with the unread totals derived from it.

use std::collections::HashSet;
use std::fmt;

use chat_core::{Conversation, ConversationPreview};

/// Unread count at which the badge stops counting
pub const BADGE_CAP: u32 = 99;

/// Unread badge shown next to the chat entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnreadBadge {
    /// Nothing unread
    #[default]
    None,
    /// Exact count below the cap
    Count(u32),
    /// At or above the cap
    Many,
}

impl UnreadBadge {
    /// Badge for a total unread count
    pub fn from_total(total: u32) -> Self {
        match total {
            0 => UnreadBadge::None,
            n if n >= BADGE_CAP => UnreadBadge::Many,
            n => UnreadBadge::Count(n),
        }
    }

    /// Check if the badge should be shown
    pub fn is_visible(&self) -> bool {
        !matches!(self, UnreadBadge::None)
    }
}

impl fmt::Display for UnreadBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreadBadge::None => Ok(()),
            UnreadBadge::Count(n) => write!(f, "{}", n),
            UnreadBadge::Many => write!(f, "{}+", BADGE_CAP),
        }
    }
}

/// Ordered conversations keyed by counterpart
#[derive(Debug, Clone, Default)]
pub struct ConversationListStore {
    conversations: Vec<Conversation>,
    loaded: bool,
}

impl ConversationListStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with a backend snapshot
    ///
    /// Backend order is kept. If the snapshot repeats a counterpart, the first
    /// entry wins. Returns how many duplicates were dropped.
    pub fn replace(&mut self, conversations: Vec<Conversation>) -> usize {
        let total = conversations.len();
        let mut seen = HashSet::with_capacity(total);
        self.conversations = conversations
            .into_iter()
            .filter(|c| seen.insert(c.user.id.clone()))
            .collect();
        self.loaded = true;
        total - self.conversations.len()
    }

    /// Reset to the empty default after a failed load
    pub fn clear(&mut self) {
        self.conversations.clear();
        self.loaded = false;
    }

    /// All conversations in backend order
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Whether a load has succeeded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of conversations ("active chats")
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Check if there are no conversations
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Conversation with `counterpart_id`
    pub fn find(&self, counterpart_id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.user.id == counterpart_id)
    }

    /// Whether a conversation with `counterpart_id` exists
    pub fn contains(&self, counterpart_id: &str) -> bool {
        self.find(counterpart_id).is_some()
    }

    /// Zero the unread count for `counterpart_id`; returns whether it changed
    pub fn mark_read(&mut self, counterpart_id: &str) -> bool {
        match self.conversations.iter_mut().find(|c| c.user.id == counterpart_id) {
            Some(convo) if convo.has_unread() => {
                convo.mark_read();
                true
            }
            _ => false,
        }
    }

    /// Unread messages across all conversations
    pub fn total_unread(&self) -> u32 {
        self.conversations
            .iter()
            .fold(0u32, |total, c| total.saturating_add(c.unread_count))
    }

    /// Number of conversations with unread messages
    pub fn unread_conversations(&self) -> usize {
        self.conversations.iter().filter(|c| c.has_unread()).count()
    }

    /// Badge for the total unread count
    pub fn badge(&self) -> UnreadBadge {
        UnreadBadge::from_total(self.total_unread())
    }

    /// Sidebar previews in list order
    pub fn previews(&self, preview_length: usize) -> Vec<ConversationPreview> {
        self.conversations
            .iter()
            .map(|c| ConversationPreview::from_conversation(c, preview_length))
            .collect()
    }
}
