//! Résumé scorer. Independent of the engine.

pub mod analyzer;
pub mod catalog;

pub use analyzer::{analyze, EducationFlags, ResumeAnalysis};

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("no file was uploaded")]
    MissingFile,

    #[error("unsupported file type '{0}'; use PDF, TXT or MD")]
    UnsupportedFormat(String),

    #[error("Word documents are not supported; export the résumé as PDF or TXT")]
    WordDocument,

    #[error("résumé text is empty")]
    EmptyText,

    #[error("failed to extract text from PDF: {0}")]
    PdfExtraction(String),
}

/// Text of an uploaded résumé, chosen by file extension.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, ResumeError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let text = match ext.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ResumeError::PdfExtraction(e.to_string()))?,
        "txt" | "md" => String::from_utf8_lossy(bytes).into_owned(),
        "doc" | "docx" => return Err(ResumeError::WordDocument),
        other => return Err(ResumeError::UnsupportedFormat(other.to_string())),
    };
    if text.trim().is_empty() {
        return Err(ResumeError::EmptyText);
    }
    Ok(text)
}
