//! State management for Campus Chat
//!
//! This crate holds the client-side chat state: the conversation list, the
//! user directory with its debounced filter, the active thread, and the
//! [`ChatController`] that coordinates backend calls across them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod controller;
pub mod conversations;
pub mod debounce;
pub mod directory;
pub mod events;
pub mod session;
pub mod thread;
pub mod view;

pub use config::{ChatConfig, ConfigError};
pub use controller::{
    ChatController, ChatError, ChatSnapshot, InitialLoad, SendOutcome, SendSkip, ThreadLoad,
};
pub use conversations::{ConversationListStore, UnreadBadge, BADGE_CAP};
pub use debounce::Debouncer;
pub use directory::UserDirectoryCache;
pub use events::{ChatEvent, Notice, NoticeLevel};
pub use session::SessionContext;
pub use thread::{ActiveThreadStore, ThreadTicket};
pub use view::{Bounds, DirectoryMenu, Point};
