use std::path::PathBuf;
use std::sync::Mutex;

use super::engine::EngineKind;
use crate::models::DocumentKind;

/// Structured record of what the pipeline did during one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    EngineAttempted {
        engine: EngineKind,
    },
    EngineSucceeded {
        engine: EngineKind,
        chars: usize,
    },
    EngineFailed {
        engine: EngineKind,
        reason: String,
        fatal: bool,
    },
    CompressionApplied {
        path: PathBuf,
        original_bytes: u64,
        compressed_bytes: u64,
    },
    CompressionSkipped {
        reason: String,
    },
    RemoteRequested {
        endpoint: String,
        file_name: String,
        compressed: bool,
    },
    RemoteResponded {
        status: u16,
    },
    BoilerplateRemoved {
        occurrences: usize,
    },
    /// Upload was not an image scan, so no engine ran.
    UploadSkipped {
        kind: DocumentKind,
        mime_type: String,
    },
}

pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Forwards pipeline events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::EngineAttempted { engine } => {
                tracing::debug!(engine = %engine, "Attempting OCR engine");
            }
            PipelineEvent::EngineSucceeded { engine, chars } => {
                tracing::info!(engine = %engine, chars, "OCR engine produced text");
            }
            PipelineEvent::EngineFailed {
                engine,
                reason,
                fatal: false,
            } => {
                tracing::warn!(engine = %engine, reason = %reason, "OCR engine failed, falling back");
            }
            PipelineEvent::EngineFailed {
                engine,
                reason,
                fatal: true,
            } => {
                tracing::error!(engine = %engine, reason = %reason, "OCR processing failed");
            }
            PipelineEvent::CompressionApplied {
                path,
                original_bytes,
                compressed_bytes,
            } => {
                tracing::info!(
                    path = %path.display(),
                    original_bytes,
                    compressed_bytes,
                    "Compressed image for upload"
                );
            }
            PipelineEvent::CompressionSkipped { reason } => {
                tracing::warn!(reason = %reason, "Image compression skipped, uploading original");
            }
            PipelineEvent::RemoteRequested {
                endpoint,
                file_name,
                compressed,
            } => {
                tracing::debug!(
                    endpoint = %endpoint,
                    file = %file_name,
                    compressed,
                    "Sending OCR.space request"
                );
            }
            PipelineEvent::RemoteResponded { status } => {
                tracing::debug!(status, "OCR provider responded");
            }
            PipelineEvent::BoilerplateRemoved { occurrences } => {
                tracing::debug!(occurrences, "Removed printer's imprint");
            }
            PipelineEvent::UploadSkipped { kind, mime_type } => {
                tracing::debug!(kind = %kind, mime = %mime_type, "Skipping OCR for non-scan upload");
            }
        }
    }
}

/// Keeps every event in memory. Useful for assertions and for callers that
/// attach the event trail to an upload record.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count_where(&self, predicate: impl Fn(&PipelineEvent) -> bool) -> usize {
        self.events().iter().filter(|&e| predicate(e)).count()
    }
}

impl PipelineObserver for MemoryObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
