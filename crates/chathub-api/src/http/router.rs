//! Axum router configuration with middleware.
//!
//! Middleware: CORS (configured origins, or any origin when none are set),
//! request tracing, and a body limit sized for document uploads.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use chathub_core::chat::document::MAX_DOCUMENT_SIZE_BYTES;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.service.allowed_origins);

    let chat_routes = Router::new()
        .route(
            "/chats",
            post(handlers::chat_history::create_chat).get(handlers::chat_history::list_chats),
        )
        .route(
            "/chats/{chat_id}",
            get(handlers::chat_history::get_chat).patch(handlers::chat_history::edit_chat),
        )
        .route(
            "/chats/{chat_id}/messages",
            get(handlers::chat_history::get_messages),
        )
        .route(
            "/chats/{chat_id}/participants",
            get(handlers::participants::list_participants)
                .post(handlers::participants::join_chat),
        )
        .route(
            "/chats/{chat_id}/sources",
            get(handlers::documents::list_sources),
        )
        // Oversized uploads are rejected by the service with a 400; the
        // transport limit only has to let them through.
        .route(
            "/chats/{chat_id}/documents",
            post(handlers::documents::import_document)
                .layer(DefaultBodyLimit::max(MAX_DOCUMENT_SIZE_BYTES * 2)),
        )
        .route("/messageRelayHub", get(handlers::relay::relay_handler));

    Router::new()
        .merge(chat_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
