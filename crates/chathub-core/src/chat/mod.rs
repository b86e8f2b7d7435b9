//! Chat orchestration for chathub.
//!
//! `ChatService` composes the four repositories into the operations exposed
//! over HTTP: creating chats, paging messages, editing sessions, membership
//! and document import.

pub mod document;
pub mod service;
