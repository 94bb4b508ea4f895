//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ConversationSnapshot, DraftRequest, DraftResponse, ErrorResponse, SubmitRequest,
    SubmitResponse, SuccessResponse,
};
use super::AppState;
use crate::runtime::{ConversationHandle, ManagerError};
use crate::state_machine::state::is_submittable;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Mount a chat view
        .route("/api/conversations", post(open_conversation))
        // Snapshot and unmount
        .route(
            "/api/conversations/:id",
            get(get_conversation).delete(dispose_conversation),
        )
        // User actions
        .route("/api/conversations/:id/draft", put(set_draft))
        .route("/api/conversations/:id/submit", post(submit))
        // Change notifications
        .route("/api/conversations/:id/stream", get(stream_conversation))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

async fn snapshot(handle: &ConversationHandle) -> Result<ConversationSnapshot, AppError> {
    let messages = handle.messages().await?;
    let draft = handle.draft().await?;
    let state = handle.state().await?;
    Ok(ConversationSnapshot::new(
        &handle.conversation_id,
        &messages,
        draft,
        &state,
    ))
}

// ============================================================
// Lifecycle
// ============================================================

async fn open_conversation(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ConversationSnapshot>), AppError> {
    let handle = state.manager.open().await?;
    Ok((StatusCode::CREATED, Json(snapshot(&handle).await?)))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationSnapshot>, AppError> {
    let handle = state.manager.get(&id).await?;
    Ok(Json(snapshot(&handle).await?))
}

async fn dispose_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.manager.dispose(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// User Actions
// ============================================================

async fn set_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DraftRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    let handle = state.manager.get(&id).await?;
    let draft = handle.set_draft(req.text).await?;
    Ok(Json(DraftResponse {
        can_send: is_submittable(&draft),
        draft,
    }))
}

async fn submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<SubmitRequest>>,
) -> Result<Json<SubmitResponse>, AppError> {
    let handle = state.manager.get(&id).await?;
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let queued = match req.text {
        Some(text) => handle.submit(text).await?,
        None => handle.submit_draft().await?,
    };
    Ok(Json(SubmitResponse { queued }))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.manager.get(&id).await?;
    // Subscribe before the snapshot so nothing falls between them
    let broadcast_rx = handle.subscribe();
    let init_event = handle.init_event().await?;
    Ok(sse_stream(handle, init_event, broadcast_rx))
}

async fn get_version() -> Json<serde_json::Value> {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    NotFound(String),
    Gone(String),
    Internal(String),
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::NotFound(_) => AppError::NotFound(err.to_string()),
            ManagerError::Closed(_) => AppError::Gone(err.to_string()),
            ManagerError::Internal(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Gone(msg) => (StatusCode::GONE, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
