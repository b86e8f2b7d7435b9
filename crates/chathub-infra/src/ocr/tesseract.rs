//! Local Tesseract OCR through the `tesseract` command-line tool.

use std::path::{Path, PathBuf};

use chathub_core::ocr::OcrEngine;
use chathub_types::config::TesseractOptions;
use chathub_types::error::{ConfigError, OcrError};
use tokio::process::Command;

/// Runs `tesseract <image> stdout --tessdata-dir <dir> -l <language>`.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    tessdata_dir: PathBuf,
    language: String,
}

impl TesseractEngine {
    /// Fails when `{file_path}/{language}.traineddata` does not exist.
    pub fn new(options: &TesseractOptions) -> Result<Self, ConfigError> {
        let tessdata_dir = PathBuf::from(&options.file_path);
        let model = tessdata_dir.join(format!("{}.traineddata", options.language));
        if !model.is_file() {
            return Err(ConfigError::Invalid {
                field: "ocr_support.tesseract.file_path",
                message: format!("language model {} not found", model.display()),
            });
        }

        Ok(Self {
            binary: PathBuf::from("tesseract"),
            tessdata_dir,
            language: options.language.clone(),
        })
    }

    /// Use a specific `tesseract` executable instead of the one on `PATH`.
    pub fn with_binary(mut self, binary: impl AsRef<Path>) -> Self {
        self.binary = binary.as_ref().to_path_buf();
        self
    }
}

fn extension_for(mime_type: &str) -> Result<&'static str, OcrError> {
    match mime_type {
        "image/png" => Ok(".png"),
        "image/jpeg" => Ok(".jpg"),
        "image/tiff" => Ok(".tif"),
        "image/bmp" => Ok(".bmp"),
        "image/gif" => Ok(".gif"),
        other => Err(OcrError::UnsupportedFormat(other.to_string())),
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn read_text(&self, image: &[u8], mime_type: &str) -> Result<String, OcrError> {
        let suffix = extension_for(mime_type)?;
        let input = tempfile::Builder::new()
            .prefix("chathub-ocr-")
            .suffix(suffix)
            .tempfile()
            .map_err(|e| OcrError::Engine(format!("failed to create temp file: {e}")))?;
        tokio::fs::write(input.path(), image)
            .await
            .map_err(|e| OcrError::Engine(format!("failed to write temp file: {e}")))?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("--tessdata-dir")
            .arg(&self.tessdata_dir)
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| OcrError::Engine(format!("failed to run {}: {e}", self.binary.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
