//! Document import and memory source handlers.
//!
//! Endpoints:
//! - POST /chats/{chat_id}/documents?fileName=.. - Import a document (raw body)
//! - GET  /chats/{chat_id}/sources                - Memory sources of the chat

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, State};
use chathub_core::chat::service::ImportedDocument;
use chathub_types::chat::MemorySource;
use chathub_types::event::RelayEvent;

use super::{authorize_chat, parse_uuid};
use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::extractors::query::{DocumentQuery, ValidQuery};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /chats/{chat_id}/documents?fileName=notes.txt
///
/// Broadcasts `document_uploaded` with the announcement message.
pub async fn import_document(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(chat_id): Path<String>,
    ValidQuery(query): ValidQuery<DocumentQuery>,
    body: Bytes,
) -> Result<ApiResponse<ImportedDocument>, AppError> {
    let start = Instant::now();
    let chat_id = parse_uuid(&chat_id)?;
    authorize_chat(&state, &user, &chat_id).await?;

    let imported = state
        .chat_service
        .import_document(&user, &chat_id, &query.file_name, &body)
        .await?;
    state.relay.publish(RelayEvent::DocumentUploaded {
        chat_id,
        message: imported.message.clone(),
    });
    Ok(ApiResponse::created(imported, start)
        .with_link("sources", format!("/chats/{chat_id}/sources")))
}

/// GET /chats/{chat_id}/sources
pub async fn list_sources(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(chat_id): Path<String>,
) -> Result<ApiResponse<Vec<MemorySource>>, AppError> {
    let start = Instant::now();
    let chat_id = parse_uuid(&chat_id)?;
    authorize_chat(&state, &user, &chat_id).await?;

    let sources = state.chat_service.list_sources(&chat_id).await?;
    Ok(ApiResponse::success(sources, start))
}
