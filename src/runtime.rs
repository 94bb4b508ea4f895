//! Runtime for executing conversations
//!
//! One runtime task per mounted chat view. The manager mounts and disposes
//! conversations and hands out handles to the HTTP layer.

mod executor;
mod scheduler;
pub mod traits;


pub use executor::ConversationRuntime;
pub use scheduler::TokioScheduler;
pub use traits::*;

use crate::config::ChatConfig;
use crate::replies::CannedReplies;
use crate::state_machine::state::{cap_input, is_submittable};
use crate::state_machine::{ConvContext, ConvState, Event};
use crate::store::{MemoryStore, Message};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio_util::sync::CancellationToken;

/// How long `dispose` waits for a runtime to process `Close`
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime =
    ConversationRuntime<Arc<MemoryStore>, TokioScheduler, Arc<CannedReplies>>;

/// Change notifications for subscribed views
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Init {
        messages: Vec<Message>,
        draft: String,
        state: ConvState,
    },
    Message {
        message: Message,
    },
    /// Sent after every append so the view scrolls the newest message into view
    RevealLatest {
        message_id: String,
    },
    StateChange {
        state: ConvState,
    },
    Draft {
        text: String,
    },
    Error {
        message: String,
    },
}

/// An event queued for a runtime
#[derive(Debug)]
pub struct Command {
    pub event: Event,
    /// Resolved once every effect of the event has run
    pub done: Option<oneshot::Sender<Result<(), String>>>,
}

impl Command {
    /// Wrap `event` with a completion signal the caller can await
    pub fn with_ack(event: Event) -> (Self, oneshot::Receiver<Result<(), String>>) {
        let (done_tx, done_rx) = oneshot::channel();
        let command = Self {
            event,
            done: Some(done_tx),
        };
        (command, done_rx)
    }
}

impl From<Event> for Command {
    fn from(event: Event) -> Self {
        Self { event, done: None }
    }
}

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Conversation not found: {0}")]
    NotFound(String),
    #[error("Conversation closed: {0}")]
    Closed(String),
    #[error("{0}")]
    Internal(String),
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    pub conversation_id: String,
    pub event_tx: mpsc::Sender<Command>,
    pub broadcast_tx: broadcast::Sender<ChatEvent>,
    store: Arc<MemoryStore>,
    max_input_chars: usize,
    cancel: CancellationToken,
}

impl ConversationHandle {
    fn closed(&self) -> ManagerError {
        ManagerError::Closed(self.conversation_id.clone())
    }

    /// Queue an event and wait until the runtime has applied it
    async fn dispatch(&self, event: Event) -> Result<(), ManagerError> {
        let (command, done) = Command::with_ack(event);
        self.event_tx
            .send(command)
            .await
            .map_err(|_| self.closed())?;
        // A dropped sender means the runtime stopped before reaching it
        done.await
            .map_err(|_| self.closed())?
            .map_err(ManagerError::Internal)
    }

    /// Submit user text. Returns whether it was accepted; blank input is
    /// silently ignored.
    ///
    /// On return the message is in the log, the draft is cleared and the
    /// reply is scheduled.
    pub async fn submit(&self, text: impl Into<String>) -> Result<bool, ManagerError> {
        let text = text.into();
        if !is_submittable(&text) {
            return Ok(false);
        }
        self.dispatch(Event::user_submit(text)).await?;
        Ok(true)
    }

    /// Submit whatever is in the input buffer
    pub async fn submit_draft(&self) -> Result<bool, ManagerError> {
        let draft = self.draft().await?;
        self.submit(draft).await
    }

    /// Replace the input buffer. Returns the text as it will be stored.
    pub async fn set_draft(&self, text: impl Into<String>) -> Result<String, ManagerError> {
        let text = text.into();
        let capped = cap_input(&text, self.max_input_chars);
        self.dispatch(Event::DraftChanged { text }).await?;
        Ok(capped)
    }

    /// Snapshot of the log, oldest first
    pub async fn messages(&self) -> Result<Vec<Message>, ManagerError> {
        self.store
            .get_messages()
            .await
            .map_err(ManagerError::Internal)
    }

    pub async fn draft(&self) -> Result<String, ManagerError> {
        self.store.get_draft().await.map_err(ManagerError::Internal)
    }

    pub async fn state(&self) -> Result<ConvState, ManagerError> {
        self.store.get_state().await.map_err(ManagerError::Internal)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Build the `Init` event for a new subscriber
    pub async fn init_event(&self) -> Result<ChatEvent, ManagerError> {
        Ok(ChatEvent::Init {
            messages: self.messages().await?,
            draft: self.draft().await?,
            state: self.state().await?,
        })
    }
}

/// Manager for all mounted conversations
pub struct ConversationManager {
    config: ChatConfig,
    replies: Arc<CannedReplies>,
    runtimes: RwLock<HashMap<String, ConversationHandle>>,
    /// Parent of every runtime's cancellation token
    shutdown: CancellationToken,
}

impl ConversationManager {
    pub fn new(config: ChatConfig, replies: CannedReplies) -> Self {
        Self {
            config,
            replies: Arc::new(replies),
            runtimes: RwLock::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Mount a new seeded conversation and start its runtime
    pub async fn open(&self) -> Result<ConversationHandle, ManagerError> {
        let conversation_id = uuid::Uuid::new_v4().to_string();
        let store = Arc::new(
            MemoryStore::seeded(&conversation_id)
                .map_err(|e| ManagerError::Internal(e.to_string()))?,
        );

        let context = ConvContext::new(&conversation_id)
            .with_reply_delay(self.config.reply_delay)
            .with_max_input_chars(self.config.max_input_chars);

        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let cancel = self.shutdown.child_token();
        let scheduler = TokioScheduler::spawn(event_tx.clone(), cancel.child_token());

        let runtime: ProductionRuntime = ConversationRuntime::new(
            context,
            ConvState::Idle,
            store.clone(),
            scheduler,
            self.replies.clone(),
            event_rx,
            broadcast_tx.clone(),
            cancel.clone(),
        );

        let conv_id = conversation_id.clone();
        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(conv_id = %conv_id, "Conversation runtime finished");
        });

        let handle = ConversationHandle {
            conversation_id: conversation_id.clone(),
            event_tx,
            broadcast_tx,
            store,
            max_input_chars: self.config.max_input_chars,
            cancel,
        };

        self.runtimes
            .write()
            .await
            .insert(conversation_id.clone(), handle.clone());
        tracing::info!(conv_id = %conversation_id, "Conversation mounted");

        Ok(handle)
    }

    /// Get a handle to a mounted conversation
    pub async fn get(&self, conversation_id: &str) -> Result<ConversationHandle, ManagerError> {
        self.runtimes
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| ManagerError::NotFound(conversation_id.to_string()))
    }

    /// Unmount a conversation. Events already queued are applied first;
    /// replies still pending are dropped.
    pub async fn dispose(&self, conversation_id: &str) -> Result<(), ManagerError> {
        let handle = self
            .runtimes
            .write()
            .await
            .remove(conversation_id)
            .ok_or_else(|| ManagerError::NotFound(conversation_id.to_string()))?;

        match tokio::time::timeout(CLOSE_TIMEOUT, handle.dispatch(Event::Close)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(conv_id = %conversation_id, error = %e, "Runtime already stopped");
            }
            Err(_) => {
                tracing::warn!(conv_id = %conversation_id, "Runtime did not close in time");
            }
        }
        // Backstop; a runtime that closed normally has already cancelled it
        handle.cancel.cancel();

        tracing::info!(conv_id = %conversation_id, "Conversation disposed");
        Ok(())
    }

    pub async fn mounted_count(&self) -> usize {
        self.runtimes.read().await.len()
    }

    /// Stop every runtime
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
