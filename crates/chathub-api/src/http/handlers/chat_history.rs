//! Chat session and message handlers.
//!
//! Endpoints:
//! - POST  /chats                      - Create a chat owned by the caller
//! - GET   /chats                      - Chats the caller participates in
//! - GET   /chats/{chat_id}            - Get a single chat
//! - PATCH /chats/{chat_id}            - Edit title, system description, memory balance
//! - GET   /chats/{chat_id}/messages   - Page through messages, newest first

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use chathub_core::chat::service::{ChatEdit, NewChat};
use chathub_types::chat::{ChatMessage, ChatSession};
use chathub_types::event::RelayEvent;
use serde::Deserialize;

use super::{authorize_chat, parse_uuid};
use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::extractors::query::{MessagePageQuery, ValidQuery};
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub title: String,
}

/// POST /chats
pub async fn create_chat(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<CreateChatRequest>,
) -> Result<ApiResponse<NewChat>, AppError> {
    let start = Instant::now();
    let created = state.chat_service.create_chat(&user, &body.title).await?;
    let href = format!("/chats/{}", created.session.id);
    Ok(ApiResponse::created(created, start)
        .with_link("self", href.clone())
        .with_link("messages", format!("{href}/messages")))
}

/// GET /chats
pub async fn list_chats(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<ApiResponse<Vec<ChatSession>>, AppError> {
    let start = Instant::now();
    let chats = state.chat_service.list_chats(&user.user_id).await?;
    Ok(ApiResponse::success(chats, start).with_link("self", "/chats"))
}

/// GET /chats/{chat_id}
pub async fn get_chat(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(chat_id): Path<String>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let start = Instant::now();
    let chat_id = parse_uuid(&chat_id)?;
    let session = authorize_chat(&state, &user, &chat_id).await?;
    Ok(ApiResponse::success(session, start).with_link("self", format!("/chats/{chat_id}")))
}

/// PATCH /chats/{chat_id}
///
/// Broadcasts `chat_edited` to the chat's relay group.
pub async fn edit_chat(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(chat_id): Path<String>,
    Json(edit): Json<ChatEdit>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let start = Instant::now();
    let chat_id = parse_uuid(&chat_id)?;
    authorize_chat(&state, &user, &chat_id).await?;

    let session = state.chat_service.edit_chat(&chat_id, edit).await?;
    state.relay.publish(RelayEvent::ChatEdited {
        chat_id,
        session: session.clone(),
    });
    Ok(ApiResponse::success(session, start).with_link("self", format!("/chats/{chat_id}")))
}

/// GET /chats/{chat_id}/messages?startIdx=0&count=-1
pub async fn get_messages(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(chat_id): Path<String>,
    ValidQuery(page): ValidQuery<MessagePageQuery>,
) -> Result<ApiResponse<Vec<ChatMessage>>, AppError> {
    let start = Instant::now();
    let chat_id = parse_uuid(&chat_id)?;
    authorize_chat(&state, &user, &chat_id).await?;

    let messages = state
        .chat_service
        .get_messages(&chat_id, page.start_idx, page.count)
        .await?;
    Ok(ApiResponse::success(messages, start)
        .with_link("chat", format!("/chats/{chat_id}")))
}
