//! Conversation state types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay before the simulated assistant reply lands
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);

/// Input capture limit, in characters
pub const DEFAULT_MAX_INPUT_CHARS: usize = 500;

// ============================================================================
// Conversation State
// ============================================================================

/// Conversation state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// No replies outstanding
    #[default]
    Idle,

    /// One or more replies scheduled but not yet delivered
    ReplyPending {
        /// User message ids awaiting a reply, oldest first
        pending: Vec<String>,
    },

    /// View unmounted; no further events are accepted
    Closed,
}

impl ConvState {
    /// Number of replies still outstanding
    pub fn pending_replies(&self) -> usize {
        match self {
            ConvState::ReplyPending { pending } => pending.len(),
            ConvState::Idle | ConvState::Closed => 0,
        }
    }

    /// Whether the assistant is "typing"
    pub fn is_reply_pending(&self) -> bool {
        self.pending_replies() > 0
    }

    /// Short name used in notifications and logs
    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::ReplyPending { .. } => "reply_pending",
            ConvState::Closed => "closed",
        }
    }
}

/// Context for a conversation (immutable configuration)
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub conversation_id: String,
    pub reply_delay: Duration,
    pub max_input_chars: usize,
}

impl ConvContext {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            reply_delay: DEFAULT_REPLY_DELAY,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }
}

// ============================================================================
// Input capture
// ============================================================================

/// True when `text` contains something other than whitespace
pub fn is_submittable(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Cap `text` at `max_chars` characters, cutting on a char boundary
pub fn cap_input(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text.get(..byte_idx).unwrap_or(text).to_string(),
        None => text.to_string(),
    }
}
