use super::ExtractedScan;
use crate::config::OcrDriver;
use crate::error::Result;
use crate::models::{DocumentKind, SourceImage};
use crate::ocr::{OcrProvider, PipelineEvent};

/// Whether an upload of this kind and MIME type should be OCR'd.
pub fn is_ocr_candidate(kind: DocumentKind, mime_type: &str) -> bool {
    kind == DocumentKind::OriginalScan && mime_type.trim().to_ascii_lowercase().starts_with("image/")
}

/// Entry point used when a document is attached to a sitting.
pub struct ScanTextExtractor {
    provider: OcrProvider,
}

impl ScanTextExtractor {
    pub fn new(provider: OcrProvider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &OcrProvider {
        &self.provider
    }

    /// Extract text from an uploaded scan
    ///
    /// # Returns
    /// `None` when the upload is not an image scan and no engine was run.
    pub async fn extract_for_upload(
        &self,
        kind: DocumentKind,
        image: &SourceImage,
        driver: OcrDriver,
    ) -> Result<Option<ExtractedScan>> {
        if !is_ocr_candidate(kind, image.mime_type()) {
            self.provider.observer().on_event(&PipelineEvent::UploadSkipped {
                kind,
                mime_type: image.mime_type().to_string(),
            });
            return Ok(None);
        }

        let extraction = self.provider.extract_text(image, driver).await?;
        let text = extraction.into_text();
        let word_count = text
            .as_deref()
            .map(|t| t.split_whitespace().count())
            .unwrap_or(0);

        Ok(Some(ExtractedScan {
            text,
            kind,
            file_name: image.display_name(),
            word_count,
        }))
    }
}
