//! Conversation data types

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Greeting used for both seed messages
pub const SEED_GREETING: &str = "Hello! I'm your friendly bot. How can I help you today?";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message as stored in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub conversation_id: String,
    /// Strictly increasing within a conversation, starting at 1
    pub sequence_id: i64,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Local wall-clock time as two-digit `HH:MM`
    pub fn display_time(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}

/// Messages every conversation starts with, as `(sender, text)` pairs
pub fn seed_messages() -> [(Sender, &'static str); 2] {
    [
        (Sender::Assistant, SEED_GREETING),
        (Sender::User, SEED_GREETING),
    ]
}
