//! Caller identity extractor.
//!
//! With pass-through authentication every request is the default user. With
//! Azure AD the bearer token is read from:
//! - `Authorization: Bearer <jwt>` header
//! - `access_token` query parameter (browsers cannot set headers on
//!   WebSocket upgrades)

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chathub_types::error::AuthError;
use chathub_types::identity::UserIdentity;

use crate::http::error::AppError;
use crate::state::{AppState, AuthScheme};

/// The authenticated caller.
pub struct AuthenticatedUser(pub UserIdentity);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.auth.as_ref() {
            AuthScheme::PassThrough => Ok(AuthenticatedUser(UserIdentity::default_user())),
            AuthScheme::AzureAd(validator) => {
                let token = extract_token(parts)?;
                let identity = validator.validate(&token).await.map_err(|e| {
                    tracing::debug!(error = %e, "Rejected bearer token");
                    e
                })?;
                Ok(AuthenticatedUser(identity))
            }
        }
    }
}

/// Extract the bearer token from the request.
fn extract_token(parts: &Parts) -> Result<String, AuthError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AuthError::InvalidToken("invalid Authorization header encoding".to_string())
        })?;
        return auth_str
            .strip_prefix("Bearer ")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken);
    }

    parts
        .uri
        .query()
        .into_iter()
        .flat_map(|q| q.split('&'))
        .find_map(|pair| pair.strip_prefix("access_token="))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(AuthError::MissingToken)
}
