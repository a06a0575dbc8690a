//! Active thread store
//!
//! Holds the messages exchanged with the selected counterpart. Every history
//! fetch is tagged with a [`ThreadTicket`]; a response whose ticket is no longer
//! current belongs to a counterpart the user has navigated away from and is
//! discarded.

use chat_core::Message;

/// Tag identifying one history fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadTicket {
    counterpart_id: String,
    generation: u64,
}

impl ThreadTicket {
    /// Counterpart the fetch was issued for
    pub fn counterpart_id(&self) -> &str {
        &self.counterpart_id
    }

    /// Monotonic fetch number
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Messages with the selected counterpart
#[derive(Debug, Clone, Default)]
pub struct ActiveThreadStore {
    counterpart_id: Option<String>,
    messages: Vec<Message>,
    generation: u64,
    loading: bool,
}

impl ActiveThreadStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading the thread with `counterpart_id`
    ///
    /// The previous thread is discarded and any outstanding fetch is
    /// invalidated.
    pub fn begin(&mut self, counterpart_id: impl Into<String>) -> ThreadTicket {
        self.generation += 1;
        let counterpart_id = counterpart_id.into();
        self.counterpart_id = Some(counterpart_id.clone());
        self.messages.clear();
        self.loading = true;

        ThreadTicket { counterpart_id, generation: self.generation }
    }

    /// Whether `ticket` belongs to the latest fetch
    pub fn is_current(&self, ticket: &ThreadTicket) -> bool {
        ticket.generation == self.generation
            && self.counterpart_id.as_deref() == Some(ticket.counterpart_id.as_str())
    }

    /// Install fetched history; returns false if the ticket is stale
    ///
    /// Messages appended while the fetch was outstanding stay at the tail
    /// unless the history already contains them.
    pub fn resolve(&mut self, ticket: &ThreadTicket, messages: Vec<Message>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let appended = std::mem::replace(&mut self.messages, messages);
        for message in appended {
            if !self.messages.iter().any(|m| m.id == message.id) {
                self.messages.push(message);
            }
        }
        self.loading = false;
        true
    }

    /// Record a failed fetch; returns false if the ticket is stale
    pub fn fail(&mut self, ticket: &ThreadTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.loading = false;
        true
    }

    /// Append a sent message to the tail of the thread
    ///
    /// Ignored when the thread now belongs to another counterpart or already
    /// holds a message with the same ID.
    pub fn append(&mut self, counterpart_id: &str, message: Message) -> bool {
        if self.counterpart_id.as_deref() != Some(counterpart_id) {
            return false;
        }
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Drop the thread and invalidate outstanding fetches
    pub fn clear(&mut self) {
        self.generation += 1;
        self.counterpart_id = None;
        self.messages.clear();
        self.loading = false;
    }

    /// Counterpart the thread belongs to
    pub fn counterpart_id(&self) -> Option<&str> {
        self.counterpart_id.as_deref()
    }

    /// Messages in thread order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the thread has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether a history fetch is outstanding
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Newest message
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }
}
