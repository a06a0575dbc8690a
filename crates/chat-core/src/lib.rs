//! Core chat domain for Campus Chat
//!
//! This crate contains the direct-messaging data model, the directory filter,
//! presentation helpers, and the backend contract the state layer drives.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activity;
pub mod api;
pub mod display;
pub mod filter;
pub mod messages;
pub mod users;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use activity::ActivityCategory;
pub use api::{ApiError, ChatApi};
pub use display::{classify_role, format_relative_time, format_relative_time_at, RoleCategory};
pub use filter::{filter_users, RoleFilter};
pub use messages::{Conversation, ConversationPreview, Message, MessageError};
pub use users::{Role, User};
