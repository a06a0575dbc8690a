//! Campus Chat
//!
//! Client-side direct messaging state for the campus portal. The domain model
//! and backend contract live in [`chat_core`]; the stores and the session
//! controller live in [`chat_state`].

pub use chat_core;
pub use chat_state;

pub use chat_core::{ChatApi, Conversation, Message, RoleFilter, User};
pub use chat_state::{ChatConfig, ChatController, ChatEvent, ChatSnapshot, SessionContext};
