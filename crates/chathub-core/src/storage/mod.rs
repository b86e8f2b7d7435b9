//! Storage abstractions for chathub.
//!
//! Defines the generic storage context trait. Implementations (volatile,
//! filesystem, Cosmos DB) live in chathub-infra.

pub mod context;

pub use context::StorageContext;

#[cfg(test)]
pub(crate) mod testing;
