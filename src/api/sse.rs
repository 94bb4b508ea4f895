//! Server-Sent Events support

use super::types::MessageView;
use crate::runtime::{ChatEvent, ConversationHandle};
use crate::state_machine::state::is_submittable;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    handle: ConversationHandle,
    init_event: ChatEvent,
    broadcast_rx: broadcast::Receiver<ChatEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = chat_events(handle, init_event, broadcast_rx)
        .map(|event| Ok(chat_event_to_axum(event)));

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// The init event, then every broadcast. A subscriber that lags behind the
/// buffer gets a fresh init in place of the notifications it missed.
pub fn chat_events(
    handle: ConversationHandle,
    init_event: ChatEvent,
    broadcast_rx: broadcast::Receiver<ChatEvent>,
) -> impl Stream<Item = ChatEvent> {
    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(move |result| {
        let handle = handle.clone();
        async move {
            match result {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(
                        conv_id = %handle.conversation_id,
                        error = %e,
                        "Subscriber lagged, resending snapshot"
                    );
                    match handle.init_event().await {
                        Ok(init) => Some(init),
                        Err(e) => {
                            tracing::warn!(conv_id = %handle.conversation_id, error = %e, "Snapshot failed");
                            None
                        }
                    }
                }
            }
        }
    });

    stream::once(async move { init_event }).chain(broadcasts)
}

/// Event name and JSON payload for a notification
pub fn chat_event_payload(event: ChatEvent) -> (&'static str, serde_json::Value) {
    match event {
        ChatEvent::Init {
            messages,
            draft,
            state,
        } => (
            "init",
            json!({
                "type": "init",
                "messages": messages.iter().map(MessageView::from).collect::<Vec<_>>(),
                "can_send": is_submittable(&draft),
                "draft": draft,
                "reply_pending": state.is_reply_pending(),
                "state": state,
            }),
        ),
        ChatEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": MessageView::from(&message)
            }),
        ),
        ChatEvent::RevealLatest { message_id } => (
            "reveal_latest",
            json!({
                "type": "reveal_latest",
                "message_id": message_id
            }),
        ),
        ChatEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "reply_pending": state.is_reply_pending(),
                "state": state
            }),
        ),
        ChatEvent::Draft { text } => (
            "draft",
            json!({
                "type": "draft",
                "can_send": is_submittable(&text),
                "draft": text
            }),
        ),
        ChatEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    }
}

fn chat_event_to_axum(event: ChatEvent) -> Event {
    let (event_type, data) = chat_event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}
