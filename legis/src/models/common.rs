use serde::{Deserialize, Serialize};

/// Kind of document attached to a sitting. Only original scans are OCR'd.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    #[default]
    OriginalScan,
    RenderedHtml,
    RenderedPdf,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OriginalScan => write!(f, "original_scan"),
            Self::RenderedHtml => write!(f, "rendered_html"),
            Self::RenderedPdf => write!(f, "rendered_pdf"),
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "original_scan" => Ok(Self::OriginalScan),
            "rendered_html" => Ok(Self::RenderedHtml),
            "rendered_pdf" => Ok(Self::RenderedPdf),
            _ => Err(format!("Unknown document kind: {s}")),
        }
    }
}

/// Outcome of a completed extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Extraction {
    Text(String),
    /// The engine ran but nothing readable remained after cleaning.
    NotFound,
}

impl Extraction {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::NotFound => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}
