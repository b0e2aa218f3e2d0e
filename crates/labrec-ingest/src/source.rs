//! Document-to-text conversion.
//!
//! Extraction works on plain text only. Each supported container format has
//! a [`DocumentSource`] that turns the raw file bytes into that text.

use std::borrow::Cow;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Converts document bytes into text.
pub trait DocumentSource: Send + Sync {
    /// Short name of the handled format, for logs.
    fn format(&self) -> &'static str;

    /// Extract the text of a document.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::ExtractionUnavailable`] when the bytes are not a
    /// readable document of this format.
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// Text layer of digital PDFs, via `pdf-extract`.
///
/// Scanned PDFs without a text layer yield empty or near-empty text; no OCR
/// is attempted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl DocumentSource for PdfTextSource {
    fn format(&self) -> &'static str {
        "pdf"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| IngestError::ExtractionUnavailable {
            reason: e.to_string(),
        })
    }
}

/// Plain text files in any common encoding.
///
/// A byte order mark selects UTF-8 or UTF-16. Without one, valid UTF-8 is
/// taken as is and anything else is decoded as windows-1252.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl DocumentSource for PlainTextSource {
    fn format(&self) -> &'static str {
        "text"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        Ok(decode_text(bytes).into_owned())
    }
}

fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return text;
    }
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return text;
    }
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text
}

static PDF: PdfTextSource = PdfTextSource;
static PLAIN_TEXT: PlainTextSource = PlainTextSource;

/// Extensions recognized as lab report documents (lowercase).
pub const REPORT_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Picks the document source for a file by its extension.
///
/// # Errors
///
/// Returns [`IngestError::UnsupportedFormat`] for any other extension.
pub fn source_for_path(path: &Path) -> Result<&'static dyn DocumentSource> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => Ok(&PDF),
        Some("txt") => Ok(&PLAIN_TEXT),
        _ => Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Reads one document and converts it to text.
///
/// # Errors
///
/// Returns an error if the format is unsupported, the file cannot be read,
/// or the document cannot be parsed.
pub fn read_document_text(path: &Path) -> Result<String> {
    let source = source_for_path(path)?;
    let bytes = std::fs::read(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let text = source.extract_text(&bytes)?;
    debug!(
        path = %path.display(),
        format = source.format(),
        bytes = bytes.len(),
        chars = text.chars().count(),
        "document converted to text"
    );
    Ok(text)
}
