//! Conversation runtime executor

use super::traits::{ReplySource, Scheduler, Storage};
use super::{ChatEvent, Command};

use crate::state_machine::{transition, ConvContext, ConvState, Effect, Event};
use crate::store::{Message, Sender};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Whether the loop keeps going after an event
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Generic conversation runtime that can work with any storage, scheduler,
/// and reply implementations
///
/// All mutation of a conversation happens on the task running [`run`], one
/// event at a time.
///
/// [`run`]: ConversationRuntime::run
pub struct ConversationRuntime<S, C, R>
where
    S: Storage + 'static,
    C: Scheduler + 'static,
    R: ReplySource + 'static,
{
    context: ConvContext,
    state: ConvState,
    storage: S,
    scheduler: C,
    replies: R,
    event_rx: mpsc::Receiver<Command>,
    broadcast_tx: broadcast::Sender<ChatEvent>,
    /// Cancelled on exit; the scheduler should hold a child of this token
    cancel: CancellationToken,
}

impl<S, C, R> ConversationRuntime<S, C, R>
where
    S: Storage + 'static,
    C: Scheduler + 'static,
    R: ReplySource + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: ConvContext,
        state: ConvState,
        storage: S,
        scheduler: C,
        replies: R,
        event_rx: mpsc::Receiver<Command>,
        broadcast_tx: broadcast::Sender<ChatEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            context,
            state,
            storage,
            scheduler,
            replies,
            event_rx,
            broadcast_tx,
            cancel,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(conv_id = %self.context.conversation_id, "Starting conversation runtime");

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                command = self.event_rx.recv() => {
                    let Some(Command { event, done }) = command else { break };
                    let result = self.process_event(event).await;
                    let stop = matches!(result, Ok(Flow::Stop));

                    if let Err(e) = &result {
                        tracing::error!(
                            conv_id = %self.context.conversation_id,
                            error = %e,
                            "Error handling event"
                        );
                        let _ = self.broadcast_tx.send(ChatEvent::Error { message: e.clone() });
                    }
                    if let Some(done) = done {
                        // The caller may have given up waiting
                        let _ = done.send(result.map(|_| ()));
                    }
                    if stop {
                        break;
                    }
                }
            }
        }

        // Stops the timer task; replies still in flight are dropped
        self.cancel.cancel();
        tracing::info!(conv_id = %self.context.conversation_id, "Conversation runtime stopped");
    }

    async fn process_event(&mut self, event: Event) -> Result<Flow, String> {
        let result =
            transition(&self.state, &self.context, event).map_err(|e| e.to_string())?;

        let previous = std::mem::replace(&mut self.state, result.new_state);

        let mut flow = Flow::Continue;
        for effect in result.effects {
            match self.execute_effect(effect).await {
                Ok(Flow::Stop) => flow = Flow::Stop,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    // PersistState follows every fallible effect, so the store still holds `previous`
                    self.state = previous;
                    return Err(e);
                }
            }
        }
        Ok(flow)
    }

    /// Execute an effect
    async fn execute_effect(&mut self, effect: Effect) -> Result<Flow, String> {
        match effect {
            Effect::AppendMessage {
                message_id,
                sender,
                text,
            } => {
                self.append(&message_id, sender, &text).await?;
                Ok(Flow::Continue)
            }

            Effect::DeliverReply { in_reply_to } => {
                let text = self.replies.next_reply();
                let message_id = uuid::Uuid::new_v4().to_string();
                let msg = self.append(&message_id, Sender::Assistant, &text).await?;
                tracing::debug!(
                    conv_id = %self.context.conversation_id,
                    in_reply_to = %in_reply_to,
                    sequence_id = msg.sequence_id,
                    "Reply delivered"
                );
                Ok(Flow::Continue)
            }

            Effect::SetDraft { text } => {
                self.storage.set_draft(&text).await?;
                let _ = self.broadcast_tx.send(ChatEvent::Draft { text });
                Ok(Flow::Continue)
            }

            Effect::PersistState => {
                self.storage.update_state(&self.state).await?;
                tracing::debug!(
                    conv_id = %self.context.conversation_id,
                    state = self.state.name(),
                    pending = self.state.pending_replies(),
                    "State persisted"
                );
                let _ = self.broadcast_tx.send(ChatEvent::StateChange {
                    state: self.state.clone(),
                });
                Ok(Flow::Continue)
            }

            Effect::ScheduleReply { delay, in_reply_to } => {
                tracing::debug!(
                    conv_id = %self.context.conversation_id,
                    in_reply_to = %in_reply_to,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Reply scheduled"
                );
                self.scheduler
                    .schedule(delay, Event::ReplyDue { in_reply_to });
                Ok(Flow::Continue)
            }

            Effect::Shutdown => Ok(Flow::Stop),
        }
    }

    /// Append a message, then tell views to bring it into view
    async fn append(&self, message_id: &str, sender: Sender, text: &str) -> Result<Message, String> {
        let msg = self.storage.add_message(message_id, sender, text).await?;
        tracing::debug!(
            conv_id = %self.context.conversation_id,
            sequence_id = msg.sequence_id,
            sender = %msg.sender,
            "Message appended"
        );

        let _ = self.broadcast_tx.send(ChatEvent::Message {
            message: msg.clone(),
        });
        let _ = self.broadcast_tx.send(ChatEvent::RevealLatest {
            message_id: msg.message_id.clone(),
        });
        Ok(msg)
    }
}
