//! HTTP request handlers.

pub mod chat_history;
pub mod documents;
pub mod participants;
pub mod relay;

use chathub_types::chat::ChatSession;
use chathub_types::error::ChatError;
use chathub_types::identity::UserIdentity;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::state::AppState;

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// Load the chat and check that `user` participates in it.
///
/// 404 when the chat does not exist, 403 when the caller is not a member.
async fn authorize_chat(
    state: &AppState,
    user: &UserIdentity,
    chat_id: &Uuid,
) -> Result<ChatSession, AppError> {
    let session = state
        .chat_service
        .get_chat(chat_id)
        .await?
        .ok_or(ChatError::NotFound)?;
    if !state
        .chat_service
        .is_participant(&user.user_id, chat_id)
        .await?
    {
        return Err(AppError::Forbidden(format!(
            "User '{}' is not a participant of chat {chat_id}",
            user.user_id
        )));
    }
    Ok(session)
}
