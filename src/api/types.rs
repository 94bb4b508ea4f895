//! API request and response types

use crate::state_machine::state::is_submittable;
use crate::state_machine::ConvState;
use crate::store::{Message, Sender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message as the view renders it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub message_id: String,
    pub sequence_id: i64,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Local `HH:MM`
    pub display_time: String,
}

impl From<&Message> for MessageView {
    fn from(msg: &Message) -> Self {
        Self {
            message_id: msg.message_id.clone(),
            sequence_id: msg.sequence_id,
            sender: msg.sender,
            text: msg.text.clone(),
            created_at: msg.created_at,
            display_time: msg.display_time(),
        }
    }
}

/// Full view of a mounted conversation
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub conversation_id: String,
    pub messages: Vec<MessageView>,
    pub draft: String,
    pub can_send: bool,
    pub reply_pending: bool,
}

impl ConversationSnapshot {
    pub fn new(
        conversation_id: impl Into<String>,
        messages: &[Message],
        draft: String,
        state: &ConvState,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: messages.iter().map(MessageView::from).collect(),
            can_send: is_submittable(&draft),
            draft,
            reply_pending: state.is_reply_pending(),
        }
    }
}

/// Request to replace the input buffer
#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub text: String,
}

/// Response with the stored input buffer
#[derive(Debug, Serialize, Deserialize)]
pub struct DraftResponse {
    pub draft: String,
    pub can_send: bool,
}

/// Request to submit a message; without `text` the current draft is sent
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Response for submit; `queued` is false for blank input
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub queued: bool,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
