//! Per-document extraction records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// The result of processing one source document.
///
/// Records are created once and never modified; a re-run extraction produces
/// a new record. Only fields that matched appear in [`fields`](Self::fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    observed_date: Option<NaiveDate>,
    fields: BTreeMap<String, FieldValue>,
}

impl ExtractionRecord {
    /// Creates a record from already extracted parts.
    pub fn new(
        source_id: impl Into<String>,
        observed_date: Option<NaiveDate>,
        fields: BTreeMap<String, FieldValue>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            observed_date,
            fields,
        }
    }

    /// Identifier of the originating document (usually the file name).
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Document date, if one was recognized.
    pub fn observed_date(&self) -> Option<NaiveDate> {
        self.observed_date
    }

    /// Extracted values keyed by requested field name.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Looks up a single field by its exact name.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Numeric reading for a field; `None` when absent or kept as text.
    pub fn numeric(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_f64)
    }

    /// Returns true when no field matched.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
