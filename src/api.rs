//! HTTP API for the chat view

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::config::ChatConfig;
use crate::replies::CannedReplies;
use crate::runtime::ConversationManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ConversationManager>,
}

impl AppState {
    pub fn new(config: ChatConfig, replies: CannedReplies) -> Self {
        Self {
            manager: Arc::new(ConversationManager::new(config, replies)),
        }
    }
}
