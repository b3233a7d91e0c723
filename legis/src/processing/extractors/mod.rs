use crate::models::DocumentKind;

/// Text recovered from an uploaded scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedScan {
    /// `None` when the engine ran but found nothing readable.
    pub text: Option<String>,
    pub kind: DocumentKind,
    pub file_name: String,
    pub word_count: usize,
}

pub mod scan;

pub use scan::{is_ocr_candidate, ScanTextExtractor};
