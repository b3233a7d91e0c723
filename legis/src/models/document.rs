use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{LegisError, Result};

#[derive(Debug, Clone)]
enum ImageContent {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// An uploaded image handed to the pipeline for one extraction call.
#[derive(Debug, Clone)]
pub struct SourceImage {
    content: ImageContent,
    mime_type: String,
    file_name: Option<String>,
}

impl SourceImage {
    /// Image already on disk. The MIME type is guessed from the extension
    /// when not declared.
    pub fn from_path(
        path: impl Into<PathBuf>,
        mime_type: Option<String>,
        file_name: Option<String>,
    ) -> Self {
        let path = path.into();
        let mime_type = mime_type.unwrap_or_else(|| {
            mime_guess::from_path(&path)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });
        let file_name = file_name.or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        });
        Self {
            content: ImageContent::Path(path),
            mime_type,
            file_name,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            content: ImageContent::Bytes(bytes),
            mime_type: mime_type.into(),
            file_name,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.to_ascii_lowercase().starts_with("image/")
    }

    /// Display name sent to engines: the original name, or `upload.<ext>`
    /// derived from the MIME type.
    pub fn display_name(&self) -> String {
        match &self.file_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("upload.{}", extension_for_mime(&self.mime_type)),
        }
    }

    /// Materializes the image at a real filesystem path. In-memory content is
    /// written to a temporary file that is removed when the returned value
    /// is dropped.
    pub fn stage(&self, work_dir: Option<&Path>) -> Result<StagedImage> {
        let file_name = self.display_name();
        match &self.content {
            ImageContent::Path(path) => {
                if !path.is_file() {
                    return Err(LegisError::InputInvalid(format!(
                        "Uploaded file not found: {}",
                        path.display()
                    )));
                }
                Ok(StagedImage {
                    path: path.clone(),
                    file_name,
                    original_name: self.file_name.clone(),
                    mime_type: self.mime_type.clone(),
                    _guard: None,
                })
            }
            ImageContent::Bytes(bytes) => {
                let suffix = Path::new(&file_name)
                    .extension()
                    .map(|ext| format!(".{}", ext.to_string_lossy()))
                    .unwrap_or_else(|| format!(".{}", extension_for_mime(&self.mime_type)));

                let mut builder = tempfile::Builder::new();
                builder.prefix("ocr_src_").suffix(&suffix);
                let mut temp = match work_dir {
                    Some(dir) => builder.tempfile_in(dir)?,
                    None => builder.tempfile()?,
                };
                temp.write_all(bytes)?;
                temp.flush()?;

                Ok(StagedImage {
                    path: temp.path().to_path_buf(),
                    file_name,
                    original_name: self.file_name.clone(),
                    mime_type: self.mime_type.clone(),
                    _guard: Some(temp),
                })
            }
        }
    }
}

/// A source image available at a filesystem path for the duration of a call.
#[derive(Debug)]
pub struct StagedImage {
    path: PathBuf,
    file_name: String,
    original_name: Option<String>,
    mime_type: String,
    _guard: Option<NamedTempFile>,
}

impl StagedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Lowercased extension of the name the image was uploaded under. `None`
    /// for nameless uploads, never derived from the MIME type.
    pub fn original_extension(&self) -> Option<String> {
        let name = self.original_name.as_deref()?;
        Path::new(name.trim())
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    pub fn size(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    pub fn is_temporary(&self) -> bool {
        self._guard.is_some()
    }
}

pub(crate) fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" | "image/x-ms-bmp" => "bmp",
        "image/tiff" => "tif",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
    }
}
