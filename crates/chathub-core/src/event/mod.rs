//! Chat-scoped event relay.
//!
//! Replaces the hub that pushes chat edits, joins and relayed messages to the
//! clients connected to the same chat.

pub mod hub;

pub use hub::{RelayHub, RelaySubscription};
