use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use serde_json::Value;

use super::compression::{compress_for_upload, needs_compression, CompressedImage};
use super::engine::{EngineKind, RecognitionEngine};
use super::observer::{PipelineEvent, PipelineObserver};
use crate::config::OcrConfig;
use crate::error::{LegisError, Result};
use crate::models::StagedImage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(default)]
    error_message: Option<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: Option<String>,
}

/// OCR.space reports errors either as a string or as a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    fn joined(&self) -> Option<String> {
        let message = match self {
            ErrorMessage::One(message) => message.trim().to_string(),
            ErrorMessage::Many(messages) => messages
                .iter()
                .map(|m| m.trim())
                .filter(|m| !m.is_empty())
                .collect::<Vec<_>>()
                .join("; "),
        };
        (!message.is_empty()).then_some(message)
    }
}

/// Client for the OCR.space `parse/image` endpoint.
#[derive(Clone)]
pub struct OcrSpaceClient {
    client: Client,
    endpoint: String,
    api_key: String,
    engine_mode: String,
    work_dir: Option<PathBuf>,
    demo_key: bool,
    observer: Arc<dyn PipelineObserver>,
}

impl OcrSpaceClient {
    pub fn new(config: &OcrConfig, observer: Arc<dyn PipelineObserver>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LegisError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            engine_mode: config.engine_mode.clone(),
            work_dir: config.work_dir.clone(),
            demo_key: config.uses_demo_key(),
            observer,
        })
    }

    /// Produces a smaller JPEG when the upload exceeds the provider's size
    /// ceiling. Any failure falls back to the original file.
    async fn maybe_compress(&self, image: &StagedImage) -> Option<CompressedImage> {
        let original_bytes = match image.size() {
            Ok(size) => size,
            Err(e) => {
                self.observer.on_event(&PipelineEvent::CompressionSkipped {
                    reason: e.to_string(),
                });
                return None;
            }
        };
        if !needs_compression(original_bytes) {
            return None;
        }

        let path = image.path().to_path_buf();
        let work_dir = self.work_dir.clone();
        let result =
            tokio::task::spawn_blocking(move || compress_for_upload(&path, work_dir.as_deref()))
                .await;

        let reason = match result {
            Ok(Ok(compressed)) => {
                self.observer.on_event(&PipelineEvent::CompressionApplied {
                    path: compressed.path().to_path_buf(),
                    original_bytes,
                    compressed_bytes: compressed.bytes,
                });
                return Some(compressed);
            }
            Ok(Err(skipped)) => skipped.to_string(),
            Err(e) => format!("compression task panicked: {e}"),
        };
        self.observer
            .on_event(&PipelineEvent::CompressionSkipped { reason });
        None
    }

    async fn build_form(
        &self,
        image: &StagedImage,
        compressed: Option<&CompressedImage>,
    ) -> Result<multipart::Form> {
        let (upload_path, upload_mime) = match compressed {
            Some(c) => (c.path(), "image/jpeg"),
            None => (image.path(), image.mime_type()),
        };
        let bytes = tokio::fs::read(upload_path).await?;

        let filetype = image.original_extension().unwrap_or_else(|| "jpg".to_string());

        let file_part = multipart::Part::bytes(bytes)
            .file_name(image.file_name().to_string())
            .mime_str(upload_mime)
            .map_err(|e| LegisError::InputInvalid(format!("Invalid MIME type: {e}")))?;

        // Text fields precede the binary part.
        Ok(multipart::Form::new()
            .text("apikey", self.api_key.clone())
            .text("detectOrientation", "true")
            .text("scale", "true")
            .text("OCREngine", self.engine_mode.clone())
            .text("isTable", "true")
            .text("filetype", filetype)
            .part("file", file_part))
    }

    async fn parse_image(&self, image: &StagedImage) -> Result<String> {
        // Held until the request completes; dropping it removes the derivative.
        let compressed = self.maybe_compress(image).await;
        let form = self.build_form(image, compressed.as_ref()).await?;

        self.observer.on_event(&PipelineEvent::RemoteRequested {
            endpoint: self.endpoint.clone(),
            file_name: image.file_name().to_string(),
            compressed: compressed.is_some(),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LegisError::RemoteRequestFailed(format!("request timed out: {e}"))
                } else {
                    LegisError::RemoteRequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        self.observer.on_event(&PipelineEvent::RemoteResponded {
            status: status.as_u16(),
        });

        let body = response
            .text()
            .await
            .map_err(|e| LegisError::RemoteRequestFailed(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(LegisError::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        LegisError::RemoteResponseInvalid(format!("response is not JSON ({e}): {body}"))
    })?;

    let parsed = serde_json::from_value::<OcrSpaceResponse>(value.clone()).ok();

    let text = parsed
        .as_ref()
        .and_then(|r| r.parsed_results.as_ref())
        .and_then(|results| results.first())
        .and_then(|first| first.parsed_text.clone());
    if let Some(text) = text {
        return Ok(text);
    }

    let provider_message = parsed
        .as_ref()
        .and_then(|r| r.error_message.as_ref())
        .and_then(ErrorMessage::joined);

    Err(LegisError::RemoteResponseInvalid(
        provider_message.unwrap_or_else(|| value.to_string()),
    ))
}

#[async_trait]
impl RecognitionEngine for OcrSpaceClient {
    fn kind(&self) -> EngineKind {
        EngineKind::OcrSpace
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        if self.demo_key {
            format!("OCR.space at {} (public demo key)", self.endpoint)
        } else {
            format!("OCR.space at {}", self.endpoint)
        }
    }

    async fn recognize(&self, image: &StagedImage) -> Result<String> {
        self.parse_image(image).await
    }
}
