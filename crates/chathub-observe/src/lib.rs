//! Observability setup shared by chathub binaries.

pub mod tracing_setup;
