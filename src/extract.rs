//! Plain-text extraction for scheme documents.
//!
//! PDFs go through `pdf-extract`; anything else is read as UTF-8 text.
//! Unreadable, non-UTF-8 or blank documents are reported as an
//! [`ExtractError`].

use std::path::Path;
use tracing::info;

/// Extraction error.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("{0} is not valid UTF-8 text")]
    NotUtf8(String),
    #[error("no text could be extracted from {0}")]
    Empty(String),
}

/// Load a document from disk as plain text.
///
/// Files with a `.pdf` extension (any case) are parsed as PDF. Everything
/// else must be UTF-8. A document with no non-whitespace text is an error.
pub fn load_document(path: &Path) -> Result<String, ExtractError> {
    let shown = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: shown.clone(),
        source,
    })?;

    let text = if is_pdf(path) {
        extract_pdf(&bytes)?
    } else {
        String::from_utf8(bytes).map_err(|_| ExtractError::NotUtf8(shown.clone()))?
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Empty(shown));
    }

    info!(path = %shown, chars = text.chars().count(), "document loaded");
    Ok(text)
}

/// Extract text from in-memory PDF bytes.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
