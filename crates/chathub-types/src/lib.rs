//! Shared domain types for chathub.
//!
//! Chat entities, the storage entity contract, typed configuration, relay
//! events and the error enums used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod identity;
pub mod storage;
