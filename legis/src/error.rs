use thiserror::Error;

use crate::ocr::EngineKind;

#[derive(Error, Debug)]
pub enum LegisError {
    #[error("Invalid input: {0}")]
    InputInvalid(String),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("OCR request failed: {0}")]
    RemoteRequestFailed(String),

    #[error("OCR provider returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("OCR provider response invalid: {0}")]
    RemoteResponseInvalid(String),

    #[error("OCR processing failed ({engine}): {source}")]
    ExtractionFailed {
        engine: EngineKind,
        #[source]
        source: Box<LegisError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LegisError {
    /// HTTP-equivalent status for the upload controller that surfaces this error.
    pub fn status_code(&self) -> u16 {
        match self {
            LegisError::InputInvalid(_) => 400,
            LegisError::EngineUnavailable(_) => 503,
            LegisError::RemoteRequestFailed(_)
            | LegisError::RemoteStatus { .. }
            | LegisError::RemoteResponseInvalid(_)
            | LegisError::ExtractionFailed { .. }
            | LegisError::Io(_)
            | LegisError::Internal(_) => 500,
        }
    }

    /// Whether the caller supplied bad input (as opposed to a processing failure).
    pub fn is_client_error(&self) -> bool {
        self.status_code() == 400
    }
}

pub type Result<T> = std::result::Result<T, LegisError>;
