//! Chat membership handlers.
//!
//! Endpoints:
//! - GET  /chats/{chat_id}/participants - List participants (members only)
//! - POST /chats/{chat_id}/participants - Join the chat as the caller

use std::time::Instant;

use axum::extract::{Path, State};
use chathub_types::chat::ChatParticipant;
use chathub_types::event::RelayEvent;

use super::{authorize_chat, parse_uuid};
use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /chats/{chat_id}/participants
pub async fn list_participants(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(chat_id): Path<String>,
) -> Result<ApiResponse<Vec<ChatParticipant>>, AppError> {
    let start = Instant::now();
    let chat_id = parse_uuid(&chat_id)?;
    authorize_chat(&state, &user, &chat_id).await?;

    let participants = state.chat_service.list_participants(&chat_id).await?;
    Ok(ApiResponse::success(participants, start))
}

/// POST /chats/{chat_id}/participants
///
/// The one chat route open to non-members. Broadcasts `user_joined`.
pub async fn join_chat(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(chat_id): Path<String>,
) -> Result<ApiResponse<ChatParticipant>, AppError> {
    let start = Instant::now();
    let chat_id = parse_uuid(&chat_id)?;

    let participant = state.chat_service.join_chat(&user.user_id, &chat_id).await?;
    state.relay.publish(RelayEvent::UserJoined {
        chat_id,
        user_id: user.user_id,
    });
    Ok(ApiResponse::created(participant, start).with_link("chat", format!("/chats/{chat_id}")))
}
