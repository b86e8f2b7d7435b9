//! OcrEngine trait definition.

use chathub_types::error::OcrError;

/// Extracts text from an image.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Read all text from the image bytes. `mime_type` is the detected image type.
    fn read_text(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> impl std::future::Future<Output = Result<String, OcrError>> + Send;
}

/// Engine used when OCR support is disabled. Every call fails with `NotSupported`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOcrEngine;

impl OcrEngine for NullOcrEngine {
    fn name(&self) -> &str {
        "none"
    }

    async fn read_text(&self, _image: &[u8], _mime_type: &str) -> Result<String, OcrError> {
        Err(OcrError::NotSupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_engine_is_not_supported() {
        let engine = NullOcrEngine;
        let err = engine.read_text(b"\x89PNG", "image/png").await.unwrap_err();
        assert!(matches!(err, OcrError::NotSupported));
        assert_eq!(engine.name(), "none");
    }
}
