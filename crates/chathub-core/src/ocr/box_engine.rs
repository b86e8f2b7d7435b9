//! BoxOcrEngine -- object-safe dynamic dispatch wrapper for OcrEngine.
//!
//! 1. `OcrEngineDyn` is an object-safe trait with boxed futures
//! 2. Blanket-impl `OcrEngineDyn` for all `T: OcrEngine`
//! 3. `BoxOcrEngine` wraps `Box<dyn OcrEngineDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use chathub_types::error::OcrError;

use super::engine::OcrEngine;

/// Object-safe version of [`OcrEngine`] with boxed futures.
pub trait OcrEngineDyn: Send + Sync {
    fn name(&self) -> &str;

    fn read_text_boxed<'a>(
        &'a self,
        image: &'a [u8],
        mime_type: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, OcrError>> + Send + 'a>>;
}

impl<T: OcrEngine> OcrEngineDyn for T {
    fn name(&self) -> &str {
        OcrEngine::name(self)
    }

    fn read_text_boxed<'a>(
        &'a self,
        image: &'a [u8],
        mime_type: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, OcrError>> + Send + 'a>> {
        Box::pin(self.read_text(image, mime_type))
    }
}

/// Type-erased OCR engine selected at startup.
pub struct BoxOcrEngine {
    inner: Box<dyn OcrEngineDyn + Send + Sync>,
}

impl BoxOcrEngine {
    pub fn new<T: OcrEngine + 'static>(engine: T) -> Self {
        Self {
            inner: Box::new(engine),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn read_text(&self, image: &[u8], mime_type: &str) -> Result<String, OcrError> {
        self.inner.read_text_boxed(image, mime_type).await
    }
}

impl std::fmt::Debug for BoxOcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxOcrEngine")
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::engine::NullOcrEngine;

    struct FixedText(&'static str);

    impl OcrEngine for FixedText {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn read_text(&self, _image: &[u8], _mime_type: &str) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_box_delegates() {
        let engine = BoxOcrEngine::new(FixedText("hello"));
        assert_eq!(engine.name(), "fixed");
        assert_eq!(engine.read_text(b"img", "image/png").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_box_null_engine() {
        let engine = BoxOcrEngine::new(NullOcrEngine);
        assert!(matches!(
            engine.read_text(b"img", "image/png").await,
            Err(OcrError::NotSupported)
        ));
    }
}
