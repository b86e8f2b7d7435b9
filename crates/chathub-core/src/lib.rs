//! Storage contracts, repositories and chat orchestration for chathub.
//!
//! This crate defines the "ports" (the storage context trait and the OCR
//! engine trait) that the infrastructure layer implements. It depends only on
//! `chathub-types` -- never on `chathub-infra` or any database/IO crate.

pub mod chat;
pub mod event;
pub mod ocr;
pub mod repository;
pub mod storage;
