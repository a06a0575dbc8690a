//! Chat session controller
//!
//! The controller is the only way to mutate chat state. It owns the three
//! stores (conversations, directory, active thread), runs the backend calls,
//! and keeps the stores consistent while calls overlap:
//!
//! - the conversation and roster loads run concurrently and never touch each
//!   other's store
//! - directory filtering is debounced behind a single cancellable timer
//! - at most one send is in flight at a time
//! - a history response for a counterpart the user has left is discarded
//!
//! Every failure degrades to an empty store plus a [`Notice`] or a log line;
//! nothing here panics on backend errors.
//!
//! # Example
//!
//! ```rust,no_run
//! use chat_state::{ChatConfig, ChatController, SessionContext};
//! # use chat_core::ChatApi;
//! # use std::sync::Arc;
//! # async fn example(api: Arc<dyn ChatApi>) {
//! let controller = ChatController::new(api, SessionContext::new("u3"), ChatConfig::default());
//! let mut events = controller.subscribe();
//!
//! controller.load_initial_data().await;
//! controller.set_search_query("ali");
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # }
//! ```

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use chat_core::activity::{sent_message_description, ActivityCategory};
use chat_core::messages::{prepare_outgoing, MessageError};
use chat_core::{ApiError, ChatApi, Conversation, ConversationPreview, Message, RoleFilter, User};

use crate::config::ChatConfig;
use crate::conversations::{ConversationListStore, UnreadBadge};
use crate::debounce::Debouncer;
use crate::directory::UserDirectoryCache;
use crate::events::{ChatEvent, Notice};
use crate::session::SessionContext;
use crate::thread::ActiveThreadStore;
use crate::view::{Bounds, DirectoryMenu, Point};

/// Errors returned by controller operations
#[derive(Debug, Error)]
pub enum ChatError {
    /// Backend call failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Outgoing message rejected before sending
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// Selected user is neither in the roster nor in the conversation list
    #[error("Unknown counterpart: {0}")]
    UnknownCounterpart(String),

    /// Selected user is the signed-in user
    #[error("Cannot start a chat with yourself")]
    SelfSelection,
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Which of the initial loads succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialLoad {
    /// Conversation list loaded
    pub conversations_loaded: bool,
    /// Roster loaded
    pub roster_loaded: bool,
}

/// Result of selecting a counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadLoad {
    /// History installed in the active thread
    Loaded {
        /// Messages in the history
        message_count: usize,
    },
    /// A later selection replaced this one before its history arrived
    Superseded,
}

/// Why a send did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendSkip {
    /// Text is blank
    EmptyText,
    /// No counterpart selected
    NoCounterpart,
    /// Another send has not finished
    SendInFlight,
}

/// Result of a send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend persisted the message
    Sent(Message),
    /// Nothing was sent
    Skipped(SendSkip),
}

/// Everything the presentation layer renders
#[derive(Debug, Clone)]
pub struct ChatSnapshot {
    /// Conversation list in backend order
    pub conversations: Vec<Conversation>,
    /// Filtered directory
    pub directory: Vec<User>,
    /// Selected counterpart
    pub selected: Option<User>,
    /// Messages with the selected counterpart
    pub thread: Vec<Message>,
    /// Compose input value
    pub compose_text: String,
    /// Directory search input value
    pub search_query: String,
    /// Directory role filter
    pub role_filter: RoleFilter,
    /// A send is in flight
    pub sending: bool,
    /// The initial loads are running
    pub initial_loading: bool,
    /// A directory search is waiting to run
    pub searching: bool,
    /// The selected thread's history is loading
    pub history_loading: bool,
    /// The directory dropdown is open
    pub directory_menu_open: bool,
    /// Total unread badge
    pub unread_badge: UnreadBadge,
}

#[derive(Debug, Default)]
struct UiState {
    selected: Option<User>,
    compose_text: String,
    menu: DirectoryMenu,
}

struct Inner {
    api: Arc<dyn ChatApi>,
    session: SessionContext,
    config: ChatConfig,
    conversations: RwLock<ConversationListStore>,
    directory: RwLock<UserDirectoryCache>,
    thread: RwLock<ActiveThreadStore>,
    ui: RwLock<UiState>,
    sending: AtomicBool,
    initial_loading: AtomicBool,
    searching: AtomicBool,
    search_debounce: Debouncer,
    events: broadcast::Sender<ChatEvent>,
}

/// Clears the in-flight flag when a send finishes, however it finishes
struct SendGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SendGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Inner {
    fn emit(&self, event: ChatEvent) {
        let _ = self.events.send(event);
    }

    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            tracing::warn!("Chat error notice: {}", notice.message);
        } else {
            tracing::info!("Chat notice: {}", notice.message);
        }
        self.emit(ChatEvent::Notice(notice));
    }

    fn scroll_to_latest(&self, counterpart_id: &str, message_count: usize) {
        self.emit(ChatEvent::ScrollToLatest {
            counterpart_id: counterpart_id.to_string(),
            message_count,
        });
    }

    /// Recompute the filtered directory
    ///
    /// `scheduled` is true when called from the debounce timer. Other callers
    /// leave the searching flag alone while a timer run is still waiting.
    fn refilter(&self, scheduled: bool) {
        let count = self.directory.write().apply_filter(self.session.current_user_id());
        if scheduled || !self.search_debounce.is_pending() {
            self.searching.store(false, Ordering::Release);
        }
        tracing::debug!(result_count = count, "Directory filtered");
        self.emit(ChatEvent::DirectoryFiltered { result_count: count });
    }

    async fn load_conversations(&self, announce_failure: bool) -> bool {
        match self.api.fetch_conversations().await {
            Ok(conversations) => {
                let count = conversations.len();
                let dropped = self.conversations.write().replace(conversations);
                if dropped > 0 {
                    tracing::warn!("Dropped {} duplicate conversations", dropped);
                }
                tracing::debug!(count, "Conversations loaded");
                self.emit(ChatEvent::ConversationsUpdated);
                true
            }
            Err(err) => {
                tracing::error!("Failed to load conversations: {}", err);
                self.conversations.write().clear();
                self.emit(ChatEvent::ConversationsUpdated);
                if announce_failure {
                    self.notify(Notice::failure("Failed to load conversations", &err));
                }
                false
            }
        }
    }

    async fn load_roster(&self) -> bool {
        match self.api.fetch_roster().await {
            Ok(roster) => {
                let breakdown = {
                    let mut directory = self.directory.write();
                    directory.replace_roster(roster);
                    directory.role_breakdown()
                };
                tracing::debug!(roles = ?breakdown, "Roster loaded");
                self.refilter(false);
                true
            }
            Err(err) => {
                tracing::error!("Failed to load users: {}", err);
                self.directory.write().clear();
                self.notify(Notice::failure("Failed to load users for chat", &err));
                false
            }
        }
    }
}

/// Controller for one chat session
///
/// Cheap to clone; clones share state. Must be used from within a tokio
/// runtime because directory filtering runs on a spawned timer.
#[derive(Clone)]
pub struct ChatController {
    inner: Arc<Inner>,
}

impl ChatController {
    /// Create a controller
    ///
    /// # Arguments
    ///
    /// * `api` - Backend the controller calls
    /// * `session` - Identity of the signed-in user
    /// * `config` - Controller configuration
    pub fn new(api: Arc<dyn ChatApi>, session: SessionContext, config: ChatConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let search_debounce = Debouncer::new(config.search_debounce());

        Self {
            inner: Arc::new(Inner {
                api,
                session,
                config,
                conversations: RwLock::new(ConversationListStore::new()),
                directory: RwLock::new(UserDirectoryCache::new()),
                thread: RwLock::new(ActiveThreadStore::new()),
                ui: RwLock::new(UiState::default()),
                sending: AtomicBool::new(false),
                initial_loading: AtomicBool::new(false),
                searching: AtomicBool::new(false),
                search_debounce,
                events,
            }),
        }
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.inner.events.subscribe()
    }

    /// Session the controller acts for
    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    /// Active configuration
    pub fn config(&self) -> &ChatConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Load the conversation list and the roster concurrently
    ///
    /// Each load handles its own failure: the affected store is left empty and
    /// an error notice is emitted. One failing never affects the other.
    pub async fn load_initial_data(&self) -> InitialLoad {
        let inner = &self.inner;
        inner.initial_loading.store(true, Ordering::Release);

        let (conversations_loaded, roster_loaded) =
            tokio::join!(inner.load_conversations(true), inner.load_roster());

        inner.initial_loading.store(false, Ordering::Release);
        tracing::info!(conversations_loaded, roster_loaded, "Initial chat data loaded");

        InitialLoad { conversations_loaded, roster_loaded }
    }

    /// Reload the conversation list; failures are logged only
    pub async fn reload_conversations(&self) -> bool {
        self.inner.load_conversations(false).await
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Make `user` the active counterpart and load the thread
    ///
    /// Closes the directory menu, clears the search, replaces the thread with
    /// the fetched history, acknowledges the messages as read and refreshes the
    /// conversation list. If another counterpart is selected before the history
    /// arrives, the response is discarded and [`ThreadLoad::Superseded`] is
    /// returned.
    pub async fn select_counterpart(&self, user: User) -> Result<ThreadLoad> {
        let inner = &self.inner;

        if inner.session.is_current_user(&user.id) {
            tracing::warn!("Ignoring selection of the signed-in user");
            return Err(ChatError::SelfSelection);
        }
        let known = inner.directory.read().contains(&user.id)
            || inner.conversations.read().contains(&user.id);
        if !known {
            tracing::warn!("Ignoring selection of unknown user {}", user.id);
            return Err(ChatError::UnknownCounterpart(user.id));
        }

        {
            let mut ui = inner.ui.write();
            ui.selected = Some(user.clone());
            ui.menu.close();
        }
        let ticket = inner.thread.write().begin(user.id.clone());
        inner.emit(ChatEvent::SelectionChanged { counterpart_id: user.id.clone() });
        self.set_search_query("");

        let message_count = match inner.api.fetch_history(&user.id).await {
            Ok(messages) => {
                let count = messages.len();
                let thread_len = {
                    let mut thread = inner.thread.write();
                    thread.resolve(&ticket, messages).then(|| thread.len())
                };
                let Some(thread_len) = thread_len else {
                    tracing::debug!(
                        counterpart = %user.id,
                        generation = ticket.generation(),
                        "Discarding stale history response"
                    );
                    return Ok(ThreadLoad::Superseded);
                };
                inner.scroll_to_latest(&user.id, thread_len);
                count
            }
            Err(err) => {
                if !inner.thread.write().fail(&ticket) {
                    tracing::debug!(counterpart = %user.id, "Ignoring stale history failure");
                    return Ok(ThreadLoad::Superseded);
                }
                tracing::error!("Failed to load chat history with {}: {}", user.id, err);
                inner.notify(Notice::failure("Failed to load chat history", &err));
                return Err(err.into());
            }
        };

        match inner.api.mark_read(&user.id).await {
            Ok(()) => {
                inner.conversations.write().mark_read(&user.id);
            }
            Err(err) => {
                tracing::warn!("Failed to mark messages from {} as read: {}", user.id, err);
            }
        }

        inner.load_conversations(false).await;

        Ok(ThreadLoad::Loaded { message_count })
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Send `text` to the selected counterpart
    ///
    /// Does nothing when the text is blank, nobody is selected, or a send is
    /// already in flight. On success the message is appended to the thread,
    /// the compose input is cleared, the conversation list is refreshed and an
    /// activity event is recorded on a best-effort basis. On failure an error
    /// notice is emitted and the compose input is left as it was.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome> {
        let inner = &self.inner;

        if text.trim().is_empty() {
            return Ok(SendOutcome::Skipped(SendSkip::EmptyText));
        }
        let selected = inner.ui.read().selected.clone();
        let Some(counterpart) = selected else {
            return Ok(SendOutcome::Skipped(SendSkip::NoCounterpart));
        };

        let body = match prepare_outgoing(text, inner.config.max_message_length) {
            Ok(body) => body,
            Err(err) => {
                inner.notify(Notice::error(err.to_string()));
                return Err(err.into());
            }
        };

        let Some(_guard) = SendGuard::acquire(&inner.sending) else {
            tracing::debug!("Send already in flight, ignoring");
            return Ok(SendOutcome::Skipped(SendSkip::SendInFlight));
        };

        let message = match inner.api.send_message(&counterpart.id, body).await {
            Ok(message) => message,
            Err(err) => {
                tracing::error!("Failed to send message to {}: {}", counterpart.id, err);
                inner.notify(Notice::failure("Failed to send message", &err));
                return Err(err.into());
            }
        };

        let thread_len = {
            let mut thread = inner.thread.write();
            thread.append(&counterpart.id, message.clone()).then(|| thread.len())
        };
        if let Some(len) = thread_len {
            inner.scroll_to_latest(&counterpart.id, len);
        }
        inner.ui.write().compose_text.clear();

        inner.load_conversations(false).await;

        let category = ActivityCategory::for_counterpart(&counterpart);
        let description = sent_message_description(&counterpart);
        if let Err(err) = inner.api.log_activity(category, &description).await {
            tracing::warn!("Failed to log chat activity: {}", err);
        }

        if inner.config.notify_on_send_success {
            inner.notify(Notice::success("Message sent successfully!"));
        }

        Ok(SendOutcome::Sent(message))
    }

    /// Replace the compose input value
    pub fn set_compose_text(&self, text: impl Into<String>) {
        self.inner.ui.write().compose_text = text.into();
    }

    /// Send the current compose input value
    pub async fn submit_compose(&self) -> Result<SendOutcome> {
        let text = self.compose_text();
        self.send_message(&text).await
    }

    // ------------------------------------------------------------------
    // Directory search
    // ------------------------------------------------------------------

    /// Set the directory search text and schedule a filter run
    pub fn set_search_query(&self, query: impl Into<String>) {
        let has_query = {
            let mut directory = self.inner.directory.write();
            directory.set_search_query(query);
            directory.has_query()
        };
        self.inner.searching.store(has_query, Ordering::Release);
        self.schedule_filter();
    }

    /// Set the directory role filter and schedule a filter run
    pub fn set_role_filter(&self, filter: RoleFilter) {
        let has_query = {
            let mut directory = self.inner.directory.write();
            directory.set_role_filter(filter);
            directory.has_query()
        };
        self.inner.searching.store(has_query, Ordering::Release);
        self.schedule_filter();
    }

    fn schedule_filter(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.search_debounce.schedule(async move {
            if let Some(inner) = weak.upgrade() {
                inner.refilter(true);
            }
        });
    }

    // ------------------------------------------------------------------
    // Directory menu
    // ------------------------------------------------------------------

    /// Open or close the directory menu; returns the new state
    pub fn toggle_directory_menu(&self) -> bool {
        self.inner.ui.write().menu.toggle()
    }

    /// Close the directory menu
    pub fn close_directory_menu(&self) {
        self.inner.ui.write().menu.close();
    }

    /// Record where the directory menu is drawn
    pub fn set_directory_menu_bounds(&self, bounds: Bounds) {
        self.inner.ui.write().menu.set_bounds(bounds);
    }

    /// Forward a pointer press; returns whether it closed the menu
    pub fn pointer_down(&self, at: Point) -> bool {
        self.inner.ui.write().menu.pointer_down(at)
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// Current state for rendering
    pub fn snapshot(&self) -> ChatSnapshot {
        let inner = &self.inner;
        let (conversations, unread_badge) = {
            let store = inner.conversations.read();
            (store.conversations().to_vec(), store.badge())
        };
        let (directory, search_query, role_filter) = {
            let directory = inner.directory.read();
            (
                directory.filtered().to_vec(),
                directory.search_query().to_string(),
                directory.role_filter().clone(),
            )
        };
        let (thread, history_loading) = {
            let thread = inner.thread.read();
            (thread.messages().to_vec(), thread.is_loading())
        };
        let ui = inner.ui.read();

        ChatSnapshot {
            conversations,
            directory,
            selected: ui.selected.clone(),
            thread,
            compose_text: ui.compose_text.clone(),
            search_query,
            role_filter,
            sending: self.is_sending(),
            initial_loading: self.is_initial_loading(),
            searching: self.is_searching(),
            history_loading,
            directory_menu_open: ui.menu.is_open(),
            unread_badge,
        }
    }

    /// Conversation list in backend order
    pub fn conversations(&self) -> Vec<Conversation> {
        self.inner.conversations.read().conversations().to_vec()
    }

    /// Sidebar previews
    pub fn conversation_previews(&self) -> Vec<ConversationPreview> {
        self.inner.conversations.read().previews(self.inner.config.preview_length)
    }

    /// Number of conversations
    pub fn active_chat_count(&self) -> usize {
        self.inner.conversations.read().len()
    }

    /// Total unread badge
    pub fn unread_badge(&self) -> UnreadBadge {
        self.inner.conversations.read().badge()
    }

    /// Filtered directory from the last filter run
    pub fn directory(&self) -> Vec<User> {
        self.inner.directory.read().filtered().to_vec()
    }

    /// Number of directory filter runs so far
    pub fn directory_revision(&self) -> u64 {
        self.inner.directory.read().revision()
    }

    /// Text to show when the filtered directory is empty
    pub fn directory_empty_hint(&self) -> String {
        self.inner.directory.read().empty_hint()
    }

    /// Selected counterpart
    pub fn selected_counterpart(&self) -> Option<User> {
        self.inner.ui.read().selected.clone()
    }

    /// Messages with the selected counterpart
    pub fn thread(&self) -> Vec<Message> {
        self.inner.thread.read().messages().to_vec()
    }

    /// Compose input value
    pub fn compose_text(&self) -> String {
        self.inner.ui.read().compose_text.clone()
    }

    /// Whether a send is in flight
    pub fn is_sending(&self) -> bool {
        self.inner.sending.load(Ordering::Acquire)
    }

    /// Whether the initial loads are running
    pub fn is_initial_loading(&self) -> bool {
        self.inner.initial_loading.load(Ordering::Acquire)
    }

    /// Whether a directory search is waiting to run
    pub fn is_searching(&self) -> bool {
        self.inner.searching.load(Ordering::Acquire)
    }

    /// Whether the selected thread's history is loading
    pub fn is_history_loading(&self) -> bool {
        self.inner.thread.read().is_loading()
    }

    /// Whether the directory menu is open
    pub fn is_directory_menu_open(&self) -> bool {
        self.inner.ui.read().menu.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::test_utils::{messages, users, FakeChatApi, FakeOp, MockChatApi};
    use std::time::Duration;

    fn controller_with(api: Arc<dyn ChatApi>) -> ChatController {
        ChatController::new(api, SessionContext::for_user(&users::me()), ChatConfig::default())
    }

    fn drain(rx: &mut broadcast::Receiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn notices(events: &[ChatEvent]) -> Vec<Notice> {
        events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::Notice(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_initial_load_populates_both_stores() {
        let api = Arc::new(
            FakeChatApi::new(users::me())
                .with_roster(users::roster())
                .with_conversations(vec![messages::conversation(users::alice(), None, 2)]),
        );
        let controller = controller_with(api.clone());

        let load = controller.load_initial_data().await;

        assert_eq!(load, InitialLoad { conversations_loaded: true, roster_loaded: true });
        assert_eq!(controller.active_chat_count(), 1);
        assert_eq!(controller.directory().len(), 4);
        assert!(controller.directory().iter().all(|u| u.id != "u0"));
        assert!(!controller.is_initial_loading());
        assert_eq!(controller.unread_badge(), UnreadBadge::Count(2));
    }

    #[tokio::test]
    async fn test_roster_failure_does_not_block_conversations() {
        let mut api = MockChatApi::new();
        api.expect_fetch_conversations()
            .times(1)
            .returning(|| Ok(vec![messages::conversation(users::bob(), None, 1)]));
        api.expect_fetch_roster()
            .times(1)
            .returning(|| Err(ApiError::Network("connection reset".to_string())));

        let controller = controller_with(Arc::new(api));
        let mut rx = controller.subscribe();

        let load = controller.load_initial_data().await;

        assert!(load.conversations_loaded);
        assert!(!load.roster_loaded);
        assert_eq!(controller.active_chat_count(), 1);
        assert!(controller.directory().is_empty());

        let notices = notices(&drain(&mut rx));
        assert_eq!(notices, vec![Notice::error(
            "Failed to load users for chat: Network error: connection reset"
        )]);
    }

    #[tokio::test]
    async fn test_conversation_failure_does_not_block_roster() {
        let api = Arc::new(
            FakeChatApi::new(users::me())
                .with_roster(users::roster())
                .failing(FakeOp::Conversations),
        );
        let controller = controller_with(api);
        let mut rx = controller.subscribe();

        let load = controller.load_initial_data().await;

        assert!(!load.conversations_loaded);
        assert!(load.roster_loaded);
        assert!(controller.conversations().is_empty());
        assert_eq!(controller.directory().len(), 4);
        assert_eq!(notices(&drain(&mut rx)), vec![Notice::error(
                "Failed to load conversations: API error (500): Conversations failed"
            )]);
    }

    #[tokio::test]
    async fn test_select_unknown_user_is_rejected() {
        let api = Arc::new(FakeChatApi::new(users::me()).with_roster(vec![users::alice()]));
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;

        let err = controller.select_counterpart(users::carol()).await.unwrap_err();
        assert!(matches!(err, ChatError::UnknownCounterpart(id) if id == "u3"));
        assert!(controller.selected_counterpart().is_none());
        assert!(api.calls().history.is_empty());
    }

    #[tokio::test]
    async fn test_select_marks_read_and_refreshes() {
        let me = users::me();
        let history = vec![
            messages::between("m1", &users::alice(), &me, "hello", 30),
            messages::between("m2", &users::alice(), &me, "are you there?", 10),
        ];
        let api = Arc::new(
            FakeChatApi::new(me.clone())
                .with_roster(users::roster())
                .with_conversations(vec![messages::conversation(
                    users::alice(),
                    history.last().cloned(),
                    2,
                )])
                .with_history("u1", history.clone()),
        );
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;
        controller.toggle_directory_menu();
        let mut rx = controller.subscribe();

        let load = controller.select_counterpart(users::alice()).await.unwrap();

        assert_eq!(load, ThreadLoad::Loaded { message_count: 2 });
        assert_eq!(controller.thread(), history);
        assert_eq!(controller.selected_counterpart().map(|u| u.id), Some("u1".to_string()));
        assert!(!controller.is_directory_menu_open());
        assert!(!controller.is_history_loading());
        assert_eq!(api.calls().mark_read, vec!["u1".to_string()]);
        assert_eq!(controller.conversations()[0].unread_count, 0);
        assert_eq!(controller.unread_badge(), UnreadBadge::None);

        let events = drain(&mut rx);
        assert!(events.contains(&ChatEvent::ScrollToLatest {
            counterpart_id: "u1".to_string(),
            message_count: 2,
        }));
    }

    #[tokio::test]
    async fn test_mark_read_failure_is_silent() {
        let mut api = MockChatApi::new();
        api.expect_fetch_conversations()
            .times(2)
            .returning(|| Ok(vec![messages::conversation(users::bob(), None, 3)]));
        api.expect_fetch_roster().times(1).returning(|| Ok(users::roster()));
        api.expect_fetch_history().times(1).returning(|_| Ok(Vec::new()));
        api.expect_mark_read()
            .times(1)
            .returning(|_| Err(ApiError::Status { status: 500, message: "boom".to_string() }));

        let controller = controller_with(Arc::new(api));
        controller.load_initial_data().await;
        let mut rx = controller.subscribe();

        let load = controller.select_counterpart(users::bob()).await.unwrap();

        assert_eq!(load, ThreadLoad::Loaded { message_count: 0 });
        assert!(notices(&drain(&mut rx)).is_empty());
        // server still reports it unread
        assert_eq!(controller.conversations()[0].unread_count, 3);
    }

    #[tokio::test]
    async fn test_history_failure_allows_retry() {
        let api = Arc::new(
            FakeChatApi::new(users::me())
                .with_roster(users::roster())
                .with_history("u2", vec![messages::between("m1", &users::bob(), &users::me(), "hey", 5)])
                .failing(FakeOp::History),
        );
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;
        let mut rx = controller.subscribe();

        let err = controller.select_counterpart(users::bob()).await.unwrap_err();
        assert!(matches!(err, ChatError::Api(_)));
        assert!(!controller.is_history_loading());
        assert!(api.calls().mark_read.is_empty());
        assert_eq!(notices(&drain(&mut rx)), vec![Notice::error(
                "Failed to load chat history: API error (500): History failed"
            )]);

        api.recover(FakeOp::History);
        let load = controller.select_counterpart(users::bob()).await.unwrap();
        assert_eq!(load, ThreadLoad::Loaded { message_count: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_history_is_discarded() {
        let me = users::me();
        let api = Arc::new(
            FakeChatApi::new(me.clone())
                .with_roster(users::roster())
                .with_history("u1", vec![messages::between("a1", &users::alice(), &me, "from alice", 5)])
                .with_history("u2", vec![messages::between("b1", &users::bob(), &me, "from bob", 5)])
                .with_history_delay("u1", Duration::from_millis(500))
                .with_history_delay("u2", Duration::from_millis(50)),
        );
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;

        let (first, second) = tokio::join!(
            controller.select_counterpart(users::alice()),
            controller.select_counterpart(users::bob()),
        );

        assert_eq!(first.unwrap(), ThreadLoad::Superseded);
        assert_eq!(second.unwrap(), ThreadLoad::Loaded { message_count: 1 });
        assert_eq!(controller.thread()[0].id, "b1");
        assert_eq!(controller.selected_counterpart().map(|u| u.id), Some("u2".to_string()));
        assert_eq!(api.calls().mark_read, vec!["u2".to_string()]);
    }

    #[tokio::test]
    async fn test_select_self_is_rejected() {
        let api = Arc::new(FakeChatApi::new(users::me()).with_roster(users::roster()));
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;

        let err = controller.select_counterpart(users::me()).await.unwrap_err();

        assert!(matches!(err, ChatError::SelfSelection));
        assert!(controller.selected_counterpart().is_none());
        assert!(api.calls().history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_history_loading_keeps_message() {
        let me = users::me();
        let api = Arc::new(
            FakeChatApi::new(me.clone())
                .with_roster(users::roster())
                .with_history("u2", vec![messages::between("old", &users::bob(), &me, "hey", 60)])
                .with_history_delay("u2", Duration::from_millis(200)),
        );
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;
        let mut rx = controller.subscribe();

        let (load, sent) = tokio::join!(controller.select_counterpart(users::bob()), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(controller.is_history_loading());
            controller.send_message("hi").await
        });

        assert_eq!(load.unwrap(), ThreadLoad::Loaded { message_count: 1 });
        let SendOutcome::Sent(sent) = sent.unwrap() else {
            panic!("expected a sent message");
        };
        let ids: Vec<String> = controller.thread().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["old".to_string(), sent.id]);

        let scrolls: Vec<usize> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                ChatEvent::ScrollToLatest { message_count, .. } => Some(message_count),
                _ => None,
            })
            .collect();
        assert_eq!(scrolls, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_send_skips() {
        let api = Arc::new(FakeChatApi::new(users::me()).with_roster(users::roster()));
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;

        let outcome = controller.send_message("hello").await.unwrap();
        assert_eq!(outcome, SendOutcome::Skipped(SendSkip::NoCounterpart));

        controller.select_counterpart(users::bob()).await.unwrap();
        let outcome = controller.send_message("   ").await.unwrap();
        assert_eq!(outcome, SendOutcome::Skipped(SendSkip::EmptyText));

        assert!(api.calls().sends.is_empty());
    }

    #[tokio::test]
    async fn test_send_appends_and_logs_activity() {
        let api = Arc::new(FakeChatApi::new(users::me()).with_roster(users::roster()));
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;
        controller.select_counterpart(users::carol()).await.unwrap();
        controller.set_compose_text("  office hours?  ");
        let mut rx = controller.subscribe();

        let outcome = controller.submit_compose().await.unwrap();

        let SendOutcome::Sent(message) = outcome else {
            panic!("expected a sent message");
        };
        assert_eq!(message.message, "office hours?");
        assert_eq!(controller.thread(), vec![message]);
        assert!(controller.compose_text().is_empty());
        assert!(!controller.is_sending());
        assert_eq!(controller.active_chat_count(), 1);
        assert_eq!(
            api.calls().activity,
            vec![(ActivityCategory::ProfessorChat, "Sent message to Carol White".to_string())]
        );

        let events = drain(&mut rx);
        assert!(events.contains(&ChatEvent::ScrollToLatest {
            counterpart_id: "u3".to_string(),
            message_count: 1,
        }));
        assert_eq!(notices(&events), vec![Notice::success("Message sent successfully!")]);
    }

    #[tokio::test]
    async fn test_activity_failure_does_not_fail_send() {
        let mut api = MockChatApi::new();
        api.expect_fetch_conversations().returning(|| Ok(Vec::new()));
        api.expect_fetch_roster().returning(|| Ok(users::roster()));
        api.expect_fetch_history().returning(|_| Ok(Vec::new()));
        api.expect_mark_read().returning(|_| Ok(()));
        api.expect_send_message()
            .times(1)
            .returning(|_, text| Ok(messages::between("s1", &users::me(), &users::bob(), text, 0)));
        api.expect_log_activity()
            .times(1)
            .returning(|_, _| Err(ApiError::Network("audit service down".to_string())));

        let controller = controller_with(Arc::new(api));
        controller.load_initial_data().await;
        controller.select_counterpart(users::bob()).await.unwrap();
        let mut rx = controller.subscribe();

        let outcome = controller.send_message("hi").await.unwrap();

        assert!(matches!(outcome, SendOutcome::Sent(_)));
        assert_eq!(controller.thread().len(), 1);
        let notices = notices(&drain(&mut rx));
        assert!(notices.iter().all(|n| !n.is_error()));
    }

    #[tokio::test]
    async fn test_send_failure_keeps_compose_text() {
        let api = Arc::new(
            FakeChatApi::new(users::me())
                .with_roster(users::roster())
                .failing(FakeOp::Send),
        );
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;
        controller.select_counterpart(users::bob()).await.unwrap();
        controller.set_compose_text("are you coming?");
        let mut rx = controller.subscribe();

        let err = controller.submit_compose().await.unwrap_err();

        assert!(matches!(err, ChatError::Api(_)));
        assert_eq!(controller.compose_text(), "are you coming?");
        assert!(controller.thread().is_empty());
        assert!(!controller.is_sending());
        assert!(api.calls().activity.is_empty());
        assert_eq!(notices(&drain(&mut rx)), vec![Notice::error(
                "Failed to send message: API error (500): Send failed"
            )]);

        api.recover(FakeOp::Send);
        assert!(matches!(controller.submit_compose().await.unwrap(), SendOutcome::Sent(_)));
    }

    #[tokio::test]
    async fn test_send_too_long_is_rejected_before_network() {
        let api = Arc::new(FakeChatApi::new(users::me()).with_roster(users::roster()));
        let controller = ChatController::new(
            api.clone(),
            SessionContext::for_user(&users::me()),
            ChatConfig::default().with_max_message_length(5),
        );
        controller.load_initial_data().await;
        controller.select_counterpart(users::bob()).await.unwrap();

        let err = controller.send_message("way too long").await.unwrap_err();

        assert!(matches!(err, ChatError::Message(MessageError::TooLong { max: 5, .. })));
        assert!(api.calls().sends.is_empty());
        assert!(!controller.is_sending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_is_single_flight() {
        let api = Arc::new(
            FakeChatApi::new(users::me())
                .with_roster(users::roster())
                .with_send_delay(Duration::from_millis(200)),
        );
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;
        controller.select_counterpart(users::bob()).await.unwrap();

        let (first, second) =
            tokio::join!(controller.send_message("hi"), controller.send_message("hi"));

        assert!(matches!(first.unwrap(), SendOutcome::Sent(_)));
        assert_eq!(second.unwrap(), SendOutcome::Skipped(SendSkip::SendInFlight));
        assert_eq!(api.calls().sends.len(), 1);
        assert_eq!(controller.thread().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_is_debounced() {
        let api = Arc::new(FakeChatApi::new(users::me()).with_roster(users::roster()));
        let controller = controller_with(api.clone());
        controller.load_initial_data().await;
        let before = controller.directory_revision();

        for query in ["c", "ca", "car", "caro"] {
            controller.set_search_query(query);
            assert!(controller.is_searching());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(controller.directory_revision(), before);

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(controller.directory_revision(), before + 1);
        assert!(!controller.is_searching());
        let ids: Vec<String> = controller.directory().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["u3".to_string()]);
        assert_eq!(api.calls().roster, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_roster_reload_keeps_pending_search() {
        let api = Arc::new(FakeChatApi::new(users::me()).with_roster(users::roster()));
        let controller = controller_with(api);
        controller.load_initial_data().await;

        controller.set_search_query("carol");
        controller.load_initial_data().await;
        assert!(controller.is_searching());

        tokio::time::sleep(Duration::from_millis(301)).await;
        assert!(!controller.is_searching());
        let ids: Vec<String> = controller.directory().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["u3".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_role_filter_is_debounced() {
        let api = Arc::new(FakeChatApi::new(users::me()).with_roster(users::roster()));
        let controller = controller_with(api);
        controller.load_initial_data().await;

        controller.set_role_filter(RoleFilter::parse("alumni"));
        assert_eq!(controller.directory().len(), 4);

        tokio::time::sleep(Duration::from_millis(301)).await;
        let ids: Vec<String> = controller.directory().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["u2".to_string()]);
    }

    #[tokio::test]
    async fn test_directory_menu_dismissal() {
        let controller = controller_with(Arc::new(FakeChatApi::new(users::me())));
        controller.set_directory_menu_bounds(Bounds::new(0.0, 0.0, 300.0, 400.0));

        assert!(controller.toggle_directory_menu());
        assert!(!controller.pointer_down(Point::new(10.0, 10.0)));
        assert!(controller.is_directory_menu_open());

        assert!(controller.pointer_down(Point::new(500.0, 10.0)));
        assert!(!controller.snapshot().directory_menu_open);
    }
}
