//! Test utilities and fixtures for chat testing
//!
//! This module provides fixture users and messages plus [`FakeChatApi`], an
//! in-memory backend with per-call delays and failure switches for driving
//! the controller deterministically under a paused tokio clock.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::activity::ActivityCategory;
use crate::api::{ApiError, ChatApi, Result};
use crate::messages::{Conversation, Message};
use crate::users::User;

pub use crate::api::MockChatApi;

/// Test users
pub mod users {
    use super::*;

    /// The signed-in user in most tests
    pub fn me() -> User {
        User::new("u0", "Morgan Reed", "morgan@campus.edu", "student").with_department("Computer Science")
    }

    /// A student
    pub fn alice() -> User {
        User::new("u1", "Alice Smith", "alice@campus.edu", "student").with_department("Physics")
    }

    /// An alumnus, with upper-case role as some backends send it
    pub fn bob() -> User {
        User::new("u2", "Bob Jones", "bjones@alumni.campus.edu", "ALUMNI").with_department("History")
    }

    /// A professor
    pub fn carol() -> User {
        User::new("u3", "Carol White", "carol@campus.edu", "PROFESSOR").with_department("Mathematics")
    }

    /// A member of management
    pub fn dan() -> User {
        User::new("u4", "Dan Brown", "dan.brown@campus.edu", "management")
    }

    /// Roster including the signed-in user
    pub fn roster() -> Vec<User> {
        vec![me(), alice(), bob(), carol(), dan()]
    }
}

/// Test messages
pub mod messages {
    use super::*;

    /// A message from `from` to `to` sent `minutes_ago` minutes before now
    pub fn between(id: &str, from: &User, to: &User, text: &str, minutes_ago: i64) -> Message {
        Message {
            id: id.to_string(),
            sender_id: from.id.clone(),
            sender_name: from.name.clone(),
            receiver_id: to.id.clone(),
            receiver_name: to.name.clone(),
            message: text.to_string(),
            timestamp: Utc::now() - ChronoDuration::minutes(minutes_ago),
            read: false,
        }
    }

    /// A conversation with `user` whose last message is `last`
    pub fn conversation(user: User, last: Option<Message>, unread_count: u32) -> Conversation {
        Conversation { user, last_message: last, unread_count }
    }
}

/// Backend operations that can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    /// `fetch_conversations`
    Conversations,
    /// `fetch_roster`
    Roster,
    /// `fetch_history`
    History,
    /// `send_message`
    Send,
    /// `mark_read`
    MarkRead,
    /// `log_activity`
    LogActivity,
}

/// Calls received by a [`FakeChatApi`]
#[derive(Debug, Clone, Default)]
pub struct FakeCalls {
    /// Number of conversation list fetches
    pub conversations: usize,
    /// Number of roster fetches
    pub roster: usize,
    /// Counterparts whose history was fetched, in call order
    pub history: Vec<String>,
    /// `(counterpart, text)` pairs sent
    pub sends: Vec<(String, String)>,
    /// Counterparts marked read
    pub mark_read: Vec<String>,
    /// Activity events logged
    pub activity: Vec<(ActivityCategory, String)>,
}

#[derive(Default)]
struct FakeState {
    roster: Vec<User>,
    conversations: Vec<Conversation>,
    histories: HashMap<String, Vec<Message>>,
    history_delays: HashMap<String, Duration>,
    send_delay: Duration,
    failing: HashSet<FakeOp>,
    calls: FakeCalls,
    next_id: u64,
}

/// In-memory chat backend
///
/// Sent messages are stored in the history and reflected in the conversation
/// list, and `mark_read` zeroes the unread count, so reloads observe the
/// effects of earlier calls.
pub struct FakeChatApi {
    current_user: User,
    state: Mutex<FakeState>,
}

impl FakeChatApi {
    /// Create an empty backend acting for `current_user`
    pub fn new(current_user: User) -> Self {
        Self { current_user, state: Mutex::new(FakeState::default()) }
    }

    /// Set the roster
    pub fn with_roster(self, roster: Vec<User>) -> Self {
        self.state.lock().roster = roster;
        self
    }

    /// Set the conversation list
    pub fn with_conversations(self, conversations: Vec<Conversation>) -> Self {
        self.state.lock().conversations = conversations;
        self
    }

    /// Set the history with `counterpart_id`
    pub fn with_history(self, counterpart_id: &str, history: Vec<Message>) -> Self {
        self.state.lock().histories.insert(counterpart_id.to_string(), history);
        self
    }

    /// Delay history responses for `counterpart_id`
    pub fn with_history_delay(self, counterpart_id: &str, delay: Duration) -> Self {
        self.state.lock().history_delays.insert(counterpart_id.to_string(), delay);
        self
    }

    /// Delay every send
    pub fn with_send_delay(self, delay: Duration) -> Self {
        self.state.lock().send_delay = delay;
        self
    }

    /// Make `op` fail until [`FakeChatApi::recover`] is called
    pub fn fail(&self, op: FakeOp) {
        self.state.lock().failing.insert(op);
    }

    /// Make `op` succeed again
    pub fn recover(&self, op: FakeOp) {
        self.state.lock().failing.remove(&op);
    }

    /// Builder form of [`FakeChatApi::fail`]
    pub fn failing(self, op: FakeOp) -> Self {
        self.fail(op);
        self
    }

    /// Snapshot of the calls received so far
    pub fn calls(&self) -> FakeCalls {
        self.state.lock().calls.clone()
    }

    fn check(state: &FakeState, op: FakeOp) -> Result<()> {
        if state.failing.contains(&op) {
            Err(ApiError::Status { status: 500, message: format!("{:?} failed", op) })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn fetch_conversations(&self) -> Result<Vec<Conversation>> {
        let mut state = self.state.lock();
        state.calls.conversations += 1;
        Self::check(&state, FakeOp::Conversations)?;
        Ok(state.conversations.clone())
    }

    async fn fetch_roster(&self) -> Result<Vec<User>> {
        let mut state = self.state.lock();
        state.calls.roster += 1;
        Self::check(&state, FakeOp::Roster)?;
        Ok(state.roster.clone())
    }

    async fn fetch_history(&self, counterpart_id: &str) -> Result<Vec<Message>> {
        // the response is built on arrival and delivered after the delay
        let (history, delay) = {
            let mut state = self.state.lock();
            state.calls.history.push(counterpart_id.to_string());
            let history = state.histories.get(counterpart_id).cloned().unwrap_or_default();
            (history, state.history_delays.get(counterpart_id).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock();
        Self::check(&state, FakeOp::History)?;
        Ok(history)
    }

    async fn send_message(&self, counterpart_id: &str, text: &str) -> Result<Message> {
        let delay = {
            let mut state = self.state.lock();
            state.calls.sends.push((counterpart_id.to_string(), text.to_string()));
            state.send_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        Self::check(&state, FakeOp::Send)?;

        let receiver = state
            .roster
            .iter()
            .find(|u| u.id == counterpart_id)
            .cloned()
            .ok_or_else(|| ApiError::Status { status: 404, message: "Receiver not found".to_string() })?;

        state.next_id += 1;
        let message = Message {
            id: format!("sent-{}", state.next_id),
            sender_id: self.current_user.id.clone(),
            sender_name: self.current_user.name.clone(),
            receiver_id: receiver.id.clone(),
            receiver_name: receiver.name.clone(),
            message: text.to_string(),
            timestamp: Utc::now(),
            read: false,
        };

        state
            .histories
            .entry(counterpart_id.to_string())
            .or_default()
            .push(message.clone());

        match state.conversations.iter().position(|c| c.user.id == counterpart_id) {
            Some(index) => state.conversations[index].last_message = Some(message.clone()),
            None => state.conversations.insert(
                0,
                Conversation { user: receiver, last_message: Some(message.clone()), unread_count: 0 },
            ),
        }

        Ok(message)
    }

    async fn mark_read(&self, counterpart_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.mark_read.push(counterpart_id.to_string());
        Self::check(&state, FakeOp::MarkRead)?;
        if let Some(convo) = state.conversations.iter_mut().find(|c| c.user.id == counterpart_id) {
            convo.mark_read();
        }
        Ok(())
    }

    async fn log_activity(&self, category: ActivityCategory, description: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.activity.push((category, description.to_string()));
        Self::check(&state, FakeOp::LogActivity)
    }
}
