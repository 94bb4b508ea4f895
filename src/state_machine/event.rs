//! Events that can occur in a conversation

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    /// User committed input. `message_id` is minted by the caller so the
    /// transition stays pure.
    UserSubmit { text: String, message_id: String },
    /// User edited the input box
    DraftChanged { text: String },

    // Timer events
    /// The reply timer for `in_reply_to` fired
    ReplyDue { in_reply_to: String },

    // Lifecycle
    /// View unmounted
    Close,
}

impl Event {
    pub fn user_submit(text: impl Into<String>) -> Self {
        Event::UserSubmit {
            text: text.into(),
            message_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}
