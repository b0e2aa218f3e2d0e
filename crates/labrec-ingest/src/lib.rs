//! Ingestion collaborators for the lab report extractor.
//!
//! - [`discovery`]: finding report files on disk
//! - [`source`]: turning PDF and text documents into plain text
//! - [`csv_import`]: reading already-tabulated values as records
//!
//! Failures here are per document. Callers report them and move on to the
//! next document.

pub mod csv_import;
pub mod discovery;
pub mod error;
pub mod source;

pub use csv_import::{CsvImport, SkippedRow, load_csv_records, read_csv_records};
pub use discovery::{expand_inputs, list_report_files};
pub use error::{IngestError, Result};
pub use source::{
    DocumentSource, PdfTextSource, PlainTextSource, read_document_text, source_for_path,
};
