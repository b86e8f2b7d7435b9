//! Query parameter extractors.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use chathub_core::chat::service::ALL_REMAINING;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::http::error::AppError;

/// `Query<T>` whose rejection is a `VALIDATION_ERROR` envelope instead of
/// axum's plain-text 400.
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ValidQuery(value))
            .map_err(|rejection| AppError::Validation(rejection.body_text()))
    }
}

/// `GET /chats/{chat_id}/messages?startIdx=0&count=-1`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageQuery {
    #[serde(default)]
    pub start_idx: i64,
    /// `-1` returns every remaining message.
    #[serde(default = "default_count")]
    pub count: i64,
}

fn default_count() -> i64 {
    ALL_REMAINING
}

/// `POST /chats/{chat_id}/documents?fileName=notes.txt`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    pub file_name: String,
}
