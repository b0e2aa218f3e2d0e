//! Error types for document ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning documents into text or records.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Document Errors ===
    /// The document could not be parsed as its container format.
    #[error("text extraction unavailable: {reason}")]
    ExtractionUnavailable { reason: String },

    /// No document source handles this file type.
    #[error("unsupported document format: {path}")]
    UnsupportedFormat { path: PathBuf },

    // === File System Errors ===
    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Errors ===
    /// The CSV input could not be read.
    #[error("failed to read CSV {label}: {source}")]
    Csv {
        label: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
