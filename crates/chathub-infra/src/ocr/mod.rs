//! OCR engine implementations and startup selection.

pub mod form_recognizer;
pub mod tesseract;

use anyhow::Context;
use chathub_core::ocr::{BoxOcrEngine, NullOcrEngine};
use chathub_types::config::{OcrSupportOptions, OcrSupportType};
use chathub_types::error::ConfigError;

pub use form_recognizer::FormRecognizerEngine;
pub use tesseract::TesseractEngine;

/// Build the OCR engine selected by `options.kind`.
pub fn build_ocr_engine(options: &OcrSupportOptions) -> anyhow::Result<BoxOcrEngine> {
    let engine = match options.kind {
        OcrSupportType::None => BoxOcrEngine::new(NullOcrEngine),
        OcrSupportType::Tesseract => {
            let tesseract = options.tesseract.as_ref().ok_or(ConfigError::MissingSection {
                option: "ocr_support",
                kind: "Tesseract",
                section: "ocr_support.tesseract",
            })?;
            BoxOcrEngine::new(TesseractEngine::new(tesseract)?)
        }
        OcrSupportType::AzureFormRecognizer => {
            let fr = options
                .azure_form_recognizer
                .as_ref()
                .ok_or(ConfigError::MissingSection {
                    option: "ocr_support",
                    kind: "AzureFormRecognizer",
                    section: "ocr_support.azure_form_recognizer",
                })?;
            BoxOcrEngine::new(
                FormRecognizerEngine::new(fr).context("failed to set up Form Recognizer client")?,
            )
        }
    };
    tracing::info!(engine = engine.name(), "OCR engine selected");
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chathub_types::config::{AzureFormRecognizerOptions, TesseractOptions};
    use tempfile::TempDir;

    #[test]
    fn none_builds_null_engine() {
        let engine = build_ocr_engine(&OcrSupportOptions::default()).unwrap();
        assert_eq!(engine.name(), "none");
    }

    #[test]
    fn tesseract_requires_model_file() {
        let tmp = TempDir::new().unwrap();
        let mut options = OcrSupportOptions {
            kind: OcrSupportType::Tesseract,
            tesseract: Some(TesseractOptions {
                file_path: tmp.path().display().to_string(),
                language: "eng".to_string(),
            }),
            azure_form_recognizer: None,
        };
        let err = build_ocr_engine(&options).err().unwrap();
        assert!(err.downcast_ref::<ConfigError>().is_some());

        std::fs::write(tmp.path().join("eng.traineddata"), b"model").unwrap();
        assert_eq!(build_ocr_engine(&options).unwrap().name(), "tesseract");

        options.tesseract = None;
        assert!(build_ocr_engine(&options).is_err());
    }

    #[test]
    fn form_recognizer_builds() {
        let options = OcrSupportOptions {
            kind: OcrSupportType::AzureFormRecognizer,
            tesseract: None,
            azure_form_recognizer: Some(AzureFormRecognizerOptions {
                endpoint: "https://example.cognitiveservices.azure.com".to_string(),
                key: "key".to_string(),
                ..Default::default()
            }),
        };
        assert_eq!(
            build_ocr_engine(&options).unwrap().name(),
            "azure-form-recognizer"
        );
    }
}
