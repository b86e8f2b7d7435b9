//! HTTP and WebSocket layer for chathub.
//!
//! Axum-based REST API under `/chats`, the relay hub at `/messageRelayHub`,
//! envelope response format and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
