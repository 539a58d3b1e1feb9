//! Document text extraction for uploaded job descriptions and resumes.
//!
//! Dispatch is by file extension (case-insensitive):
//! - `.pdf` → page-by-page text, pages joined with `\n`
//! - `.docx` / `.doc` → one line per paragraph
//! - anything else → strict UTF-8 decode of the raw bytes
//!
//! Blank output is a valid result. Callers decide whether blank text is acceptable.

mod docx;

use std::path::Path;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A document could not be turned into text. Never retried.
#[derive(Debug, Error)]
#[error("failed to extract text from {filename}: {message}")]
pub struct ExtractionError {
    pub filename: String,
    pub message: String,
}

impl ExtractionError {
    pub fn new(filename: &str, message: impl std::fmt::Display) -> Self {
        Self {
            filename: filename.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Word,
    PlainText,
}

impl DocumentKind {
    fn from_filename(filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "pdf" => DocumentKind::Pdf,
            "docx" | "doc" => DocumentKind::Word,
            _ => DocumentKind::PlainText,
        }
    }
}

/// Extracts text from an uploaded document.
pub fn extract_text(filename: &str, content: &[u8]) -> Result<String, ExtractionError> {
    let kind = DocumentKind::from_filename(filename);
    info!("Extracting text from {filename} as {kind:?}");

    let text = match kind {
        DocumentKind::Pdf => extract_pdf(content),
        DocumentKind::Word => docx::paragraphs(content).map(|p| p.join("\n")),
        DocumentKind::PlainText => decode_utf8(content),
    }
    .map_err(|message| {
        warn!("Error extracting text from {filename}: {message}");
        ExtractionError::new(filename, message)
    })?;

    info!("Extracted {} characters from {filename}", text.chars().count());
    debug!("First 100 chars: {}", text.chars().take(100).collect::<String>());
    if text.trim().is_empty() {
        warn!("No text extracted from {filename}");
    }

    Ok(text)
}

/// Runs `extract_text` on the blocking pool. PDF and DOCX parsing are CPU-bound.
pub async fn extract_upload(filename: &str, content: Bytes) -> Result<String, ExtractionError> {
    let name = filename.to_string();
    tokio::task::spawn_blocking(move || extract_text(&name, &content))
        .await
        .map_err(|e| ExtractionError::new(filename, format!("extraction task failed: {e}")))?
}

fn extract_pdf(content: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(content))
        .map_err(|_| "PDF parser aborted on malformed input".to_string())?
        .map_err(|e| e.to_string())?;

    let mut text = String::new();
    for page in pages {
        text.push_str(&page);
        text.push('\n');
    }
    Ok(text)
}

fn decode_utf8(content: &[u8]) -> Result<String, String> {
    let text = std::str::from_utf8(content).map_err(|e| format!("invalid UTF-8: {e}"))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

/// Builds a minimal in-memory .docx with one `<w:p>` per entry.
#[cfg(test)]
pub(crate) fn docx_fixture(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;

    let body: String = paragraphs
        .iter()
        .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{p}</w:t></w:r></w:p>"#))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", FileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}
