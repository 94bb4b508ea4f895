//! Pure state transition function

use super::state::{cap_input, is_submittable};
use super::{ConvContext, ConvState, Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// No state change, no effects
    fn unchanged(state: &ConvState) -> Self {
        Self::new(state.clone())
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Conversation is closed")]
    Closed,
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs. Message ids
/// arrive on the event; timestamps and reply text are filled in by the
/// executor.
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (ConvState::Closed, _) => Err(TransitionError::Closed),

        // ============================================================
        // User input
        // ============================================================

        // Blank input is ignored outright: nothing appended, draft kept
        (_, Event::UserSubmit { text, .. }) if !is_submittable(&text) => {
            Ok(TransitionResult::unchanged(state))
        }

        (ConvState::Idle | ConvState::ReplyPending { .. }, Event::UserSubmit { text, message_id }) => {
            let mut pending = match state {
                ConvState::ReplyPending { pending } => pending.clone(),
                _ => Vec::new(),
            };
            pending.push(message_id.clone());
            let text = cap_input(&text, context.max_input_chars);

            Ok(TransitionResult::new(ConvState::ReplyPending { pending })
                .with_effect(Effect::append_user_message(message_id.clone(), text))
                .with_effect(Effect::clear_draft())
                .with_effect(Effect::ScheduleReply {
                    delay: context.reply_delay,
                    in_reply_to: message_id,
                })
                .with_effect(Effect::PersistState))
        }

        (_, Event::DraftChanged { text }) => Ok(TransitionResult::unchanged(state)
            .with_effect(Effect::SetDraft {
                text: cap_input(&text, context.max_input_chars),
            })),

        // ============================================================
        // Reply delivery
        // ============================================================

        (ConvState::ReplyPending { pending }, Event::ReplyDue { in_reply_to })
            if pending.contains(&in_reply_to) =>
        {
            let mut remaining = pending.clone();
            if let Some(pos) = remaining.iter().position(|id| *id == in_reply_to) {
                remaining.remove(pos);
            }
            let new_state = if remaining.is_empty() {
                ConvState::Idle
            } else {
                ConvState::ReplyPending { pending: remaining }
            };

            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::DeliverReply { in_reply_to })
                .with_effect(Effect::PersistState))
        }

        // Stale or unknown timer: nothing to deliver
        (_, Event::ReplyDue { .. }) => Ok(TransitionResult::unchanged(state)),

        // ============================================================
        // Lifecycle
        // ============================================================

        (_, Event::Close) => Ok(TransitionResult::new(ConvState::Closed)
            .with_effect(Effect::PersistState)
            .with_effect(Effect::Shutdown)),
    }
}
