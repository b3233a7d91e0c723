//! Text extraction for scanned legislative documents.
//!
//! An [`OcrProvider`] runs an ordered plan of recognition engines against a
//! staged image:
//! - [`TesseractEngine`] runs the local `tesseract` binary
//! - [`OcrSpaceClient`] posts to the OCR.space API, compressing large uploads
//!   first (see [`compression`])
//!
//! The first engine that completes wins; its text is passed through
//! [`clean_text`] to drop the printer's imprint. In `api` mode the local
//! engine is skipped.
//!
//! Components report what they do through a [`PipelineObserver`] rather
//! than logging directly.
//!
//! ```rust,ignore
//! let provider = OcrProvider::new(&config.ocr)?;
//! let source = UploadPayload::from_base64(data_uri).into_source(config.ocr.max_upload_bytes)?;
//! match provider.extract(&source).await? {
//!     Extraction::Text(text) => store(text),
//!     Extraction::NotFound => mark_unreadable(),
//! }
//! ```

mod api;
mod cleaner;
pub mod compression;
mod engine;
mod intake;
mod observer;
mod provider;
mod tesseract;

pub use crate::config::OcrDriver;
pub use api::OcrSpaceClient;
pub use cleaner::{clean_text, strip_boilerplate};
pub use compression::{compress_for_upload, CompressedImage, CompressionSkipped};
pub use engine::{EngineKind, RecognitionEngine};
pub use intake::{UploadPayload, UploadedFile};
pub use observer::{MemoryObserver, PipelineEvent, PipelineObserver, TracingObserver};
pub use provider::OcrProvider;
pub use tesseract::TesseractEngine;
