use std::sync::Arc;

use super::api::OcrSpaceClient;
use super::cleaner::strip_boilerplate;
use super::engine::{EngineKind, RecognitionEngine};
use super::observer::{PipelineEvent, PipelineObserver, TracingObserver};
use super::tesseract::TesseractEngine;
use crate::config::{OcrConfig, OcrDriver};
use crate::error::{LegisError, Result};
use crate::models::{Extraction, SourceImage, StagedImage};

/// Result of a single engine attempt within a plan.
enum Attempt {
    Success { engine: EngineKind, text: String },
    Unavailable { engine: EngineKind, reason: LegisError },
}

/// Runs the engine plan for an image: local first unless the driver says
/// otherwise, then OCR.space. Exactly one engine's output is returned.
#[derive(Clone)]
pub struct OcrProvider {
    local: Arc<dyn RecognitionEngine>,
    remote: Arc<dyn RecognitionEngine>,
    observer: Arc<dyn PipelineObserver>,
    config: OcrConfig,
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    pub fn with_observer(config: &OcrConfig, observer: Arc<dyn PipelineObserver>) -> Result<Self> {
        let local = Arc::new(TesseractEngine::from_config(config));
        let remote = Arc::new(OcrSpaceClient::new(config, Arc::clone(&observer))?);
        Ok(Self::from_engines(config, local, remote, observer))
    }

    pub fn from_engines(
        config: &OcrConfig,
        local: Arc<dyn RecognitionEngine>,
        remote: Arc<dyn RecognitionEngine>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            local,
            remote,
            observer,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    pub fn local_engine(&self) -> &dyn RecognitionEngine {
        self.local.as_ref()
    }

    pub fn remote_engine(&self) -> &dyn RecognitionEngine {
        self.remote.as_ref()
    }

    pub fn observer(&self) -> &dyn PipelineObserver {
        self.observer.as_ref()
    }

    /// Extracts text using the configured driver.
    pub async fn extract(&self, image: &SourceImage) -> Result<Extraction> {
        self.extract_text(image, self.config.driver).await
    }

    pub async fn extract_text(&self, image: &SourceImage, driver: OcrDriver) -> Result<Extraction> {
        // The staged copy lives until this call returns.
        let staged = image.stage(self.config.work_dir.as_deref())?;

        let mut last_failure = None;
        for engine in self.plan(driver) {
            match self.attempt(engine.as_ref(), &staged).await {
                Attempt::Success { engine, text } => {
                    self.observer.on_event(&PipelineEvent::EngineSucceeded {
                        engine,
                        chars: text.chars().count(),
                    });
                    return Ok(self.finish(&text));
                }
                Attempt::Unavailable { engine, reason } => {
                    self.observer.on_event(&PipelineEvent::EngineFailed {
                        engine,
                        reason: reason.to_string(),
                        fatal: engine.is_remote(),
                    });
                    last_failure = Some((engine, reason));
                }
            }
        }

        match last_failure {
            Some((engine, reason)) => Err(LegisError::ExtractionFailed {
                engine,
                source: Box::new(reason),
            }),
            None => Err(LegisError::Internal("OCR plan was empty".to_string())),
        }
    }

    fn plan(&self, driver: OcrDriver) -> Vec<Arc<dyn RecognitionEngine>> {
        match driver {
            OcrDriver::Api => vec![Arc::clone(&self.remote)],
            OcrDriver::Auto => vec![Arc::clone(&self.local), Arc::clone(&self.remote)],
        }
    }

    async fn attempt(&self, engine: &dyn RecognitionEngine, image: &StagedImage) -> Attempt {
        let kind = engine.kind();
        self.observer
            .on_event(&PipelineEvent::EngineAttempted { engine: kind });

        match engine.recognize(image).await {
            Ok(text) => Attempt::Success { engine: kind, text },
            Err(reason) => Attempt::Unavailable {
                engine: kind,
                reason,
            },
        }
    }

    fn finish(&self, raw: &str) -> Extraction {
        let (cleaned, occurrences) = strip_boilerplate(raw);
        if occurrences > 0 {
            self.observer
                .on_event(&PipelineEvent::BoilerplateRemoved { occurrences });
        }

        if cleaned.trim().is_empty() {
            Extraction::NotFound
        } else {
            Extraction::Text(cleaned)
        }
    }
}
