//! OCR engine abstraction.
//!
//! The engine trait is implemented in chathub-infra (Azure Form Recognizer,
//! local Tesseract, or a no-op). `BoxOcrEngine` erases the concrete type so
//! the engine can be chosen from configuration at startup.

pub mod box_engine;
pub mod engine;

pub use box_engine::BoxOcrEngine;
pub use engine::{NullOcrEngine, OcrEngine};
