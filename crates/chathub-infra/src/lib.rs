//! Infrastructure layer for chathub.
//!
//! Contains the storage backends behind the `StorageContext` trait from
//! `chathub-core` (in-memory, JSON files, Azure Cosmos DB), the OCR engines,
//! Azure AD bearer token validation and the configuration file loader.

pub mod auth;
pub mod config;
pub mod ocr;
pub mod storage;
