pub mod extractors;

pub use extractors::{is_ocr_candidate, ExtractedScan, ScanTextExtractor};
