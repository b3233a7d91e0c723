use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::engine::{EngineKind, RecognitionEngine};
use crate::config::OcrConfig;
use crate::error::{LegisError, Result};
use crate::models::StagedImage;

/// Local OCR through the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    languages: String,
    timeout: Duration,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<String>, languages: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
            timeout,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            config.tesseract_binary.clone(),
            config.languages.clone(),
            Duration::from_secs(config.local_timeout_secs),
        )
    }

    fn resolve_binary(&self) -> Option<PathBuf> {
        which::which(&self.binary).ok()
    }
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Tesseract
    }

    fn is_available(&self) -> bool {
        self.resolve_binary().is_some()
    }

    fn availability_hint(&self) -> String {
        match self.resolve_binary() {
            Some(path) => format!("Tesseract available at {}", path.display()),
            None => format!(
                "'{}' not found on PATH. Install with: apt install tesseract-ocr",
                self.binary
            ),
        }
    }

    async fn recognize(&self, image: &StagedImage) -> Result<String> {
        let child = Command::new(&self.binary)
            .arg(image.path())
            .arg("stdout")
            .args(["-l", self.languages.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    LegisError::EngineUnavailable(format!("{} not found", self.binary))
                }
                _ => LegisError::EngineUnavailable(format!("failed to start {}: {e}", self.binary)),
            })?;

        // Dropping the wait future on timeout kills the child.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                LegisError::EngineUnavailable(format!(
                    "{} timed out after {} seconds",
                    self.binary,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| LegisError::EngineUnavailable(format!("{} failed: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LegisError::EngineUnavailable(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceImage;

    fn staged() -> (tempfile::TempDir, StagedImage) {
        let dir = tempfile::tempdir().unwrap();
        let image = SourceImage::from_bytes(b"img".to_vec(), "image/png", Some("page.png".into()));
        let staged = image.stage(Some(dir.path())).unwrap();
        (dir, staged)
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let engine = TesseractEngine::new("legis-no-such-tesseract", "eng", Duration::from_secs(5));
        assert!(!engine.is_available());
        assert!(engine.availability_hint().contains("not found"));

        let (_dir, image) = staged();
        let err = engine.recognize(&image).await.unwrap_err();
        assert!(matches!(err, LegisError::EngineUnavailable(_)));
        assert!(err.to_string().contains("not found"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_unavailable() {
        let engine = TesseractEngine::new("false", "eng", Duration::from_secs(5));
        let (_dir, image) = staged();

        let err = engine.recognize(&image).await.unwrap_err();
        assert!(matches!(err, LegisError::EngineUnavailable(_)));
        assert!(err.to_string().contains("exited"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_returned_verbatim() {
        // `echo` stands in for tesseract and prints its arguments.
        let engine = TesseractEngine::new("echo", "eng+fra", Duration::from_secs(5));
        let (_dir, image) = staged();

        let text = engine.recognize(&image).await.unwrap();
        assert!(text.contains("stdout -l eng+fra"), "{text}");
        assert!(text.contains(image.path().to_str().unwrap()), "{text}");
    }
}
