//! Chat controller configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use chat_core::messages::{DEFAULT_PREVIEW_LENGTH, MAX_MESSAGE_LENGTH};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config could not be parsed
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Chat controller configuration
///
/// Missing fields take their defaults when loading from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    /// Quiet period before a directory search runs, in milliseconds
    pub search_debounce_ms: u64,
    /// Longest message accepted for sending, in characters
    pub max_message_length: usize,
    /// Graphemes of the last message shown in a conversation preview
    pub preview_length: usize,
    /// Buffer size of the event channel
    pub event_capacity: usize,
    /// Emit a success notice after each send
    pub notify_on_send_success: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 300,
            max_message_length: MAX_MESSAGE_LENGTH,
            preview_length: DEFAULT_PREVIEW_LENGTH,
            event_capacity: 64,
            notify_on_send_success: true,
        }
    }
}

impl ChatConfig {
    /// Load and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ChatConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_message_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "maxMessageLength",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "eventCapacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Debounce window as a duration
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Set the debounce window
    pub fn with_search_debounce(mut self, window: Duration) -> Self {
        self.search_debounce_ms = window.as_millis() as u64;
        self
    }

    /// Set the maximum message length
    pub fn with_max_message_length(mut self, max: usize) -> Self {
        self.max_message_length = max;
        self
    }

    /// Set the preview length
    pub fn with_preview_length(mut self, graphemes: usize) -> Self {
        self.preview_length = graphemes;
        self
    }

    /// Enable or disable the success notice after sending
    pub fn with_send_success_notice(mut self, enabled: bool) -> Self {
        self.notify_on_send_success = enabled;
        self
    }
}
