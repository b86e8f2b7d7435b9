//! Azure Form Recognizer OCR engine using the prebuilt read model.
//!
//! Analysis is asynchronous on the service side: the submit call returns an
//! `Operation-Location` URL that is polled until the operation finishes.

use std::time::Duration;

use chathub_core::ocr::OcrEngine;
use chathub_types::config::AzureFormRecognizerOptions;
use chathub_types::error::OcrError;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

const API_VERSION: &str = "2023-07-31";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    content: String,
}

/// OCR through the Form Recognizer REST API.
///
/// The subscription key is stored as a [`SecretString`] and only exposed
/// when building request headers.
pub struct FormRecognizerEngine {
    client: reqwest::Client,
    endpoint: String,
    key: SecretString,
    poll_interval: Duration,
    max_polls: u32,
}

impl FormRecognizerEngine {
    pub fn new(options: &AzureFormRecognizerOptions) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.request_timeout_secs))
            .build()
            .map_err(|e| OcrError::Service(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: options.endpoint.trim_end_matches('/').to_string(),
            key: SecretString::from(options.key.clone()),
            poll_interval: Duration::from_secs(1),
            max_polls: 60,
        })
    }

    /// Override the polling cadence (used by tests).
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/prebuilt-read:analyze?api-version={API_VERSION}",
            self.endpoint
        )
    }

    async fn submit(&self, image: &[u8], mime_type: &str) -> Result<String, OcrError> {
        let response = self
            .client
            .post(self.analyze_url())
            .header(KEY_HEADER, self.key.expose_secret())
            .header(CONTENT_TYPE, mime_type)
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| OcrError::Service(format!("analyze request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                415 => OcrError::UnsupportedFormat(mime_type.to_string()),
                _ => OcrError::Service(format!("HTTP {status}: {body}")),
            });
        }

        response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| OcrError::Service("response has no Operation-Location header".to_string()))
    }

    async fn poll(&self, operation_url: &str) -> Result<String, OcrError> {
        for _ in 0..self.max_polls {
            let response = self
                .client
                .get(operation_url)
                .header(KEY_HEADER, self.key.expose_secret())
                .send()
                .await
                .map_err(|e| OcrError::Service(format!("poll request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(OcrError::Service(format!("HTTP {status}: {body}")));
            }

            let operation: AnalyzeOperation = response
                .json()
                .await
                .map_err(|e| OcrError::Service(format!("invalid analyze response: {e}")))?;

            match operation.status.as_str() {
                "succeeded" => {
                    return Ok(operation
                        .analyze_result
                        .map(|r| r.content)
                        .unwrap_or_default());
                }
                "failed" => {
                    let detail = operation
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "no error detail".to_string());
                    return Err(OcrError::Service(format!("analysis failed: {detail}")));
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
        Err(OcrError::Timeout)
    }
}

impl OcrEngine for FormRecognizerEngine {
    fn name(&self) -> &str {
        "azure-form-recognizer"
    }

    async fn read_text(&self, image: &[u8], mime_type: &str) -> Result<String, OcrError> {
        let operation_url = self.submit(image, mime_type).await?;
        tracing::debug!(bytes = image.len(), mime_type, "Submitted document for analysis");
        self.poll(&operation_url).await
    }
}
