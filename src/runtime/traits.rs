//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::replies::CannedReplies;
use crate::state_machine::{ConvState, Event};
use crate::store::{MemoryStore, Message, Sender};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Storage for conversation messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message to the conversation
    async fn add_message(
        &self,
        message_id: &str,
        sender: Sender,
        text: &str,
    ) -> Result<Message, String>;

    /// Get all messages for the conversation, oldest first
    async fn get_messages(&self) -> Result<Vec<Message>, String>;
}

/// Storage for the input buffer
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn set_draft(&self, text: &str) -> Result<(), String>;

    async fn get_draft(&self) -> Result<String, String>;
}

/// Storage for conversation state
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn update_state(&self, state: &ConvState) -> Result<(), String>;

    async fn get_state(&self) -> Result<ConvState, String>;
}

/// Combined storage trait for convenience
pub trait Storage: MessageStore + DraftStore + StateStore {}
impl<T: MessageStore + DraftStore + StateStore> Storage for T {}

/// One-shot delayed delivery of an event back into the conversation
pub trait Scheduler: Send + Sync {
    /// Fire-and-forget: must not block the caller
    fn schedule(&self, delay: Duration, event: Event);
}

/// Where assistant reply text comes from
pub trait ReplySource: Send + Sync {
    fn next_reply(&self) -> String;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: MessageStore + ?Sized> MessageStore for Arc<T> {
    async fn add_message(
        &self,
        message_id: &str,
        sender: Sender,
        text: &str,
    ) -> Result<Message, String> {
        (**self).add_message(message_id, sender, text).await
    }

    async fn get_messages(&self) -> Result<Vec<Message>, String> {
        (**self).get_messages().await
    }
}

#[async_trait]
impl<T: DraftStore + ?Sized> DraftStore for Arc<T> {
    async fn set_draft(&self, text: &str) -> Result<(), String> {
        (**self).set_draft(text).await
    }

    async fn get_draft(&self) -> Result<String, String> {
        (**self).get_draft().await
    }
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn update_state(&self, state: &ConvState) -> Result<(), String> {
        (**self).update_state(state).await
    }

    async fn get_state(&self) -> Result<ConvState, String> {
        (**self).get_state().await
    }
}

impl<T: Scheduler + ?Sized> Scheduler for Arc<T> {
    fn schedule(&self, delay: Duration, event: Event) {
        (**self).schedule(delay, event);
    }
}

impl<T: ReplySource + ?Sized> ReplySource for Arc<T> {
    fn next_reply(&self) -> String {
        (**self).next_reply()
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl MessageStore for MemoryStore {
    async fn add_message(
        &self,
        message_id: &str,
        sender: Sender,
        text: &str,
    ) -> Result<Message, String> {
        MemoryStore::add_message(self, message_id, sender, text).map_err(|e| e.to_string())
    }

    async fn get_messages(&self) -> Result<Vec<Message>, String> {
        MemoryStore::get_messages(self).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl DraftStore for MemoryStore {
    async fn set_draft(&self, text: &str) -> Result<(), String> {
        MemoryStore::set_draft(self, text).map_err(|e| e.to_string())
    }

    async fn get_draft(&self) -> Result<String, String> {
        MemoryStore::get_draft(self).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn update_state(&self, state: &ConvState) -> Result<(), String> {
        MemoryStore::update_state(self, state).map_err(|e| e.to_string())
    }

    async fn get_state(&self) -> Result<ConvState, String> {
        MemoryStore::get_state(self).map_err(|e| e.to_string())
    }
}

impl ReplySource for CannedReplies {
    fn next_reply(&self) -> String {
        self.choose()
    }
}
