use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;

use crate::error::{LegisError, Result};
use crate::models::SourceImage;

/// A file the upload controller already wrote to disk.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub original_name: Option<String>,
    pub mime_type: Option<String>,
}

/// Image supplied either as a direct upload or as a base64 payload
/// (`data:<mime>;base64,<data>` or bare base64).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadPayload {
    pub file: Option<UploadedFile>,
    pub image_base64: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

impl UploadPayload {
    pub fn from_file(file: UploadedFile) -> Self {
        Self {
            file: Some(file),
            ..Default::default()
        }
    }

    pub fn from_base64(data: impl Into<String>) -> Self {
        Self {
            image_base64: Some(data.into()),
            ..Default::default()
        }
    }

    /// Resolves the payload into a [`SourceImage`]. A direct file wins over a
    /// base64 payload when both are present.
    pub fn into_source(self, max_bytes: u64) -> Result<SourceImage> {
        if let Some(file) = self.file {
            let size = std::fs::metadata(&file.path)
                .map_err(|e| {
                    LegisError::InputInvalid(format!(
                        "Uploaded file {} is unreadable: {e}",
                        file.path.display()
                    ))
                })?
                .len();
            check_size(size, max_bytes)?;

            let name = file.original_name.or(self.file_name);
            // Controller temp files carry no useful extension, so content
            // is sniffed before falling back to the name.
            let mime = file
                .mime_type
                .or(self.mime_type)
                .or_else(|| {
                    infer::get_from_path(&file.path)
                        .ok()
                        .flatten()
                        .map(|kind| kind.mime_type().to_string())
                })
                .or_else(|| {
                    name.as_deref()
                        .and_then(|n| mime_guess::from_path(n).first())
                        .map(|m| m.essence_str().to_string())
                });
            return Ok(SourceImage::from_path(file.path, mime, name));
        }

        let Some(raw) = self.image_base64 else {
            return Err(LegisError::InputInvalid(
                "No image uploaded: provide a file or a base64 payload".to_string(),
            ));
        };

        let (header_mime, data) = split_data_uri(&raw)?;
        let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|e| LegisError::InputInvalid(format!("Invalid base64 image data: {e}")))?;

        if bytes.is_empty() {
            return Err(LegisError::InputInvalid(
                "Decoded image payload is empty".to_string(),
            ));
        }
        check_size(bytes.len() as u64, max_bytes)?;

        let mime = header_mime
            .or(self.mime_type)
            .or_else(|| infer::get(&bytes).map(|kind| kind.mime_type().to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Ok(SourceImage::from_bytes(bytes, mime, self.file_name))
    }
}

fn check_size(size: u64, max_bytes: u64) -> Result<()> {
    if size == 0 {
        return Err(LegisError::InputInvalid("Uploaded image is empty".to_string()));
    }
    if size > max_bytes {
        return Err(LegisError::InputInvalid(format!(
            "Uploaded image is {size} bytes, limit is {max_bytes}"
        )));
    }
    Ok(())
}

/// Splits `data:<mime>;base64,<data>` into its MIME type and payload. Bare
/// base64 is returned unchanged with no MIME type.
fn split_data_uri(raw: &str) -> Result<(Option<String>, &str)> {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return Ok((None, trimmed));
    };

    let Some((header, data)) = rest.split_once(',') else {
        return Err(LegisError::InputInvalid(
            "Malformed data URI: missing ',' separator".to_string(),
        ));
    };

    let mut parts = header.split(';');
    let mime = parts
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_ascii_lowercase);
    if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(LegisError::InputInvalid(
            "Data URI must be base64 encoded".to_string(),
        ));
    }

    Ok((mime, data))
}
