//! In-memory conversation store
//!
//! A conversation lives only as long as its view is mounted, so nothing
//! here touches disk.

mod schema;

pub use schema::*;

use crate::state_machine::ConvState;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store lock poisoned: {0}")]
    Poisoned(String),
    #[error("Duplicate message id: {0}")]
    DuplicateMessage(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Default)]
struct Inner {
    messages: Vec<Message>,
    next_sequence_id: i64,
    draft: String,
    state: ConvState,
}

/// Append-only message log, input buffer, and state for one conversation
#[derive(Debug)]
pub struct MemoryStore {
    conversation_id: String,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            inner: Mutex::new(Inner {
                next_sequence_id: 1,
                ..Inner::default()
            }),
        }
    }

    /// Create a store holding the seed messages
    pub fn seeded(conversation_id: impl Into<String>) -> StoreResult<Self> {
        let store = Self::new(conversation_id);
        for (sender, text) in seed_messages() {
            let id = uuid::Uuid::new_v4().to_string();
            store.add_message(&id, sender, text)?;
        }
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    // ==================== Message Operations ====================

    /// Append a message stamped with the next sequence id and the current time
    pub fn add_message(&self, message_id: &str, sender: Sender, text: &str) -> StoreResult<Message> {
        let mut inner = self.lock()?;
        if inner.messages.iter().any(|m| m.message_id == message_id) {
            return Err(StoreError::DuplicateMessage(message_id.to_string()));
        }

        let msg = Message {
            message_id: message_id.to_string(),
            conversation_id: self.conversation_id.clone(),
            sequence_id: inner.next_sequence_id,
            sender,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        inner.next_sequence_id += 1;
        inner.messages.push(msg.clone());
        Ok(msg)
    }

    /// Snapshot of the log in conversational order
    pub fn get_messages(&self) -> StoreResult<Vec<Message>> {
        Ok(self.lock()?.messages.clone())
    }

    #[allow(dead_code)] // Used in tests
    pub fn message_count(&self) -> StoreResult<usize> {
        Ok(self.lock()?.messages.len())
    }

    // ==================== Draft Operations ====================

    pub fn get_draft(&self) -> StoreResult<String> {
        Ok(self.lock()?.draft.clone())
    }

    pub fn set_draft(&self, text: &str) -> StoreResult<()> {
        text.clone_into(&mut self.lock()?.draft);
        Ok(())
    }

    // ==================== State Operations ====================

    pub fn get_state(&self) -> StoreResult<ConvState> {
        Ok(self.lock()?.state.clone())
    }

    pub fn update_state(&self, state: &ConvState) -> StoreResult<()> {
        self.lock()?.state = state.clone();
        Ok(())
    }
}
