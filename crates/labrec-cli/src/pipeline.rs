//! Batch document processing.
//!
//! Documents are independent: each one is read, converted to text and run
//! through the extractor on the rayon pool. Results come back in input
//! order, and a failed document never stops the rest of the batch.

use std::path::{Path, PathBuf};

use labrec_extract::{Extraction, Extractor};
use labrec_ingest::{IngestError, read_document_text};
use labrec_model::ExtractionRecord;
use rayon::prelude::*;
use tracing::{debug, info, info_span, trace, warn};

use crate::logging::redact_value;

/// Result of processing one input document.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub result: Result<Extraction, IngestError>,
}

impl DocumentOutcome {
    /// The extracted record, when the document could be read.
    pub fn record(&self) -> Option<&ExtractionRecord> {
        self.result.as_ref().ok().map(|extraction| &extraction.record)
    }
}

/// Counts over a processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub documents: usize,
    pub failed: usize,
    /// Documents with a recognized date.
    pub dated: usize,
    /// Requested fields found, summed over all documents.
    pub fields_found: usize,
}

impl BatchSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Source id for a document: its file name, or the full path when it has none.
pub fn source_id(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Read one document and extract `fields` from it.
///
/// # Errors
///
/// Returns the ingestion error if the document cannot be turned into text.
pub fn process_document<S: AsRef<str>>(
    path: &Path,
    fields: &[S],
    extractor: &Extractor<'_>,
) -> Result<Extraction, IngestError> {
    let text = read_document_text(path)?;
    let extraction = extractor.extract_detailed(&source_id(path), &text, fields);
    for (field, value) in extraction.record.fields() {
        trace!(
            field = field.as_str(),
            value = redact_value(&value.to_string()),
            "extracted value"
        );
    }
    Ok(extraction)
}

/// Process every document in parallel, preserving input order.
pub fn process_documents<S: AsRef<str> + Sync>(
    paths: &[PathBuf],
    fields: &[S],
    extractor: &Extractor<'_>,
) -> Vec<DocumentOutcome> {
    let span = info_span!("batch", documents = paths.len());
    let _guard = span.enter();

    let outcomes: Vec<DocumentOutcome> = paths
        .par_iter()
        .map(|path| {
            let span = info_span!("document", path = %path.display());
            let _guard = span.enter();
            let result = process_document(path, fields, extractor);
            match &result {
                Ok(extraction) => debug!(
                    found = extraction.found_count(),
                    dated = extraction.date_found(),
                    "document processed"
                ),
                Err(error) => warn!(%error, "document skipped"),
            }
            DocumentOutcome {
                path: path.clone(),
                result,
            }
        })
        .collect();

    let summary = summarize(&outcomes);
    info!(
        documents = summary.documents,
        failed = summary.failed,
        dated = summary.dated,
        fields_found = summary.fields_found,
        "batch finished"
    );
    outcomes
}

/// Count documents, failures, dated records and found fields.
pub fn summarize(outcomes: &[DocumentOutcome]) -> BatchSummary {
    let mut summary = BatchSummary {
        documents: outcomes.len(),
        ..BatchSummary::default()
    };
    for outcome in outcomes {
        match &outcome.result {
            Ok(extraction) => {
                summary.fields_found += extraction.found_count();
                if extraction.date_found() {
                    summary.dated += 1;
                }
            }
            Err(_) => summary.failed += 1,
        }
    }
    summary
}

/// Records of the documents that were read, in input order.
pub fn successful_records(outcomes: &[DocumentOutcome]) -> Vec<ExtractionRecord> {
    outcomes
        .iter()
        .filter_map(DocumentOutcome::record)
        .cloned()
        .collect()
}
