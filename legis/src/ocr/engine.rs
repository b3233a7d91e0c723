use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::StagedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Tesseract,
    OcrSpace,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Tesseract => "tesseract",
            EngineKind::OcrSpace => "ocr.space",
        }
    }

    /// Remote attempts are the last resort, so their failure ends the call.
    pub fn is_remote(&self) -> bool {
        matches!(self, EngineKind::OcrSpace)
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend that turns an image on disk into raw, uncleaned text.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Readiness check only. Does not run recognition.
    fn is_available(&self) -> bool;

    /// One-line description for operators, e.g. the resolved binary path.
    fn availability_hint(&self) -> String;

    async fn recognize(&self, image: &StagedImage) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_display() {
        assert_eq!(EngineKind::Tesseract.to_string(), "tesseract");
        assert_eq!(EngineKind::OcrSpace.to_string(), "ocr.space");
    }

    #[test]
    fn test_only_ocr_space_is_remote() {
        assert!(EngineKind::OcrSpace.is_remote());
        assert!(!EngineKind::Tesseract.is_remote());
    }
}
