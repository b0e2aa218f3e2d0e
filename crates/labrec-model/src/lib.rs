//! Lab report data model.
//!
//! Types shared by the extractor, the ingestion collaborators and the CLI:
//!
//! - [`FieldValue`]: a numeric reading or, when coercion fails, the raw text
//! - [`ExtractionRecord`]: the immutable result of processing one document
//! - [`FieldOutcome`]: per-field diagnostics produced alongside a record
//!
//! A field that was not found is never represented by a placeholder value;
//! it is simply absent from [`ExtractionRecord::fields`].

pub mod outcome;
pub mod record;
pub mod value;

pub use outcome::FieldOutcome;
pub use record::ExtractionRecord;
pub use value::FieldValue;

/// Fields captured by the original intake form, in its column order.
pub const DEFAULT_FIELDS: &[&str] = &[
    "HbA1c", "Glucose", "Hb", "Platelet", "WBC", "ESR", "ALT", "AST", "Calcium", "PSA",
];
