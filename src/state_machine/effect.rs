//! Effects produced by state transitions

use crate::store::Sender;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the log
    AppendMessage {
        message_id: String,
        sender: Sender,
        text: String,
    },

    /// Append an assistant reply chosen by the reply source
    DeliverReply { in_reply_to: String },

    /// Replace the input buffer contents
    SetDraft { text: String },

    /// Persist the new state
    PersistState,

    /// Schedule a `ReplyDue` event after `delay`
    ScheduleReply { delay: Duration, in_reply_to: String },

    /// Stop the runtime loop
    Shutdown,
}

impl Effect {
    pub fn append_user_message(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            message_id: message_id.into(),
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn clear_draft() -> Self {
        Effect::SetDraft {
            text: String::new(),
        }
    }
}
