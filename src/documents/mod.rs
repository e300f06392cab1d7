//! Uploaded documents
//!
//! A session holds at most one [`ExtractedDocument`]: the text of the most
//! recently uploaded `.txt` or `.pdf` file.

pub mod processor;

pub use processor::DocumentProcessor;

use serde::{Deserialize, Serialize};

use crate::types::{AppError, AppResult};

/// Accepted upload formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Pdf,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> AppResult<Self> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Ok(DocumentKind::Text),
            "pdf" => Ok(DocumentKind::Pdf),
            _ => Err(AppError::UnsupportedFileType(filename.to_string())),
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Text => write!(f, "txt"),
            DocumentKind::Pdf => write!(f, "pdf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub filename: String,
    pub kind: DocumentKind,
    pub text: String,
    /// Number of pages for PDFs; always 1 for plain text.
    pub page_count: usize,
}

/// What the page shows about the loaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub kind: DocumentKind,
    pub page_count: usize,
    pub char_count: usize,
}

impl From<&ExtractedDocument> for DocumentSummary {
    fn from(doc: &ExtractedDocument) -> Self {
        Self {
            filename: doc.filename.clone(),
            kind: doc.kind,
            page_count: doc.page_count,
            char_count: doc.text.chars().count(),
        }
    }
}
