//! Extraction orchestrator.
//!
//! Turns one document's text into one [`ExtractionRecord`]:
//! normalize, try each requested field's rule (first candidate that matches
//! wins), coerce the capture, then locate the document date once.
//!
//! Extraction never fails. Unmatched fields are omitted from the record,
//! never filled with a zero or an empty string, and a missing date is simply
//! `None`. No retries, cross-field checks or unit conversion happen here.

use std::collections::{BTreeMap, HashSet};

use labrec_model::{ExtractionRecord, FieldOutcome, FieldValue};
use tracing::{debug, debug_span};

use crate::coerce::coerce;
use crate::date::{DateLocator, default_locator};
use crate::normalize::normalize;
use crate::registry::{FieldPatternRegistry, default_registry};

/// A record plus the per-field outcomes that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub record: ExtractionRecord,
    /// One entry per distinct requested field, in request order.
    pub outcomes: Vec<FieldOutcome>,
}

impl Extraction {
    /// Returns true when a document date was recognized.
    pub fn date_found(&self) -> bool {
        self.record.observed_date().is_some()
    }

    /// Number of requested fields that ended up in the record.
    pub fn found_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_found()).count()
    }
}

/// Field and date extractor over a registry and a date locator.
///
/// Both collaborators are read-only, so one extractor can be shared across
/// threads and used for any number of documents.
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    registry: &'a FieldPatternRegistry,
    locator: &'a DateLocator,
}

impl Default for Extractor<'static> {
    fn default() -> Self {
        Self::new(default_registry(), default_locator())
    }
}

impl<'a> Extractor<'a> {
    /// Creates an extractor over the given registry and locator.
    pub fn new(registry: &'a FieldPatternRegistry, locator: &'a DateLocator) -> Self {
        Self { registry, locator }
    }

    /// The registry this extractor consults.
    pub fn registry(&self) -> &'a FieldPatternRegistry {
        self.registry
    }

    /// Extract the requested fields and the document date from `text`.
    pub fn extract<S: AsRef<str>>(
        &self,
        source_id: &str,
        text: &str,
        requested_fields: &[S],
    ) -> ExtractionRecord {
        self.extract_detailed(source_id, text, requested_fields)
            .record
    }

    /// Like [`extract`](Self::extract) but also returns per-field outcomes.
    ///
    /// Requested fields are de-duplicated case-insensitively; the first
    /// spelling wins and is used as the record key.
    pub fn extract_detailed<S: AsRef<str>>(
        &self,
        source_id: &str,
        text: &str,
        requested_fields: &[S],
    ) -> Extraction {
        let span = debug_span!("extract", source = %source_id);
        let _guard = span.enter();

        let text = normalize(text);
        let mut seen = HashSet::new();
        let mut fields = BTreeMap::new();
        let mut outcomes = Vec::with_capacity(requested_fields.len());

        for requested in requested_fields {
            let field = requested.as_ref().trim();
            if field.is_empty() || !seen.insert(field.to_uppercase()) {
                continue;
            }
            let rule = self.registry.rules_for(field);
            let outcome = match rule.find(&text) {
                Some(found) => match coerce(found.raw) {
                    value @ FieldValue::Numeric(_) => {
                        fields.insert(field.to_string(), value);
                        FieldOutcome::Matched {
                            field: field.to_string(),
                            candidate: found.candidate,
                        }
                    }
                    FieldValue::Raw(raw) => {
                        debug!(field, candidate = found.candidate, "value kept as text");
                        fields.insert(field.to_string(), FieldValue::Raw(raw.clone()));
                        FieldOutcome::CoercionFallback {
                            field: field.to_string(),
                            candidate: found.candidate,
                            raw,
                        }
                    }
                },
                None => FieldOutcome::NoMatch {
                    field: field.to_string(),
                },
            };
            debug!(field, outcome = outcome.label(), "field processed");
            outcomes.push(outcome);
        }

        let observed_date = self.locator.locate(&text);
        if observed_date.is_none() {
            debug!("no document date found");
        }

        Extraction {
            record: ExtractionRecord::new(source_id, observed_date, fields),
            outcomes,
        }
    }
}

/// Extract `requested_fields` from `text` with the default registry and
/// date locator.
pub fn extract_record<S: AsRef<str>>(
    source_id: &str,
    text: &str,
    requested_fields: &[S],
) -> ExtractionRecord {
    Extractor::default().extract(source_id, text, requested_fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const REPORT: &str =
        "Patient Report HbA1c 6.8 % Glucose 142 mg/dL Received On : 01/09/2025";

    #[test]
    fn test_end_to_end_report() {
        let record = extract_record("report.pdf", REPORT, &["HbA1c", "Glucose", "Hb"]);
        assert_eq!(record.get("HbA1c"), Some(&FieldValue::Numeric(6.8)));
        assert_eq!(record.get("Glucose"), Some(&FieldValue::Numeric(142.0)));
        assert!(!record.fields().contains_key("Hb"));
        assert_eq!(record.observed_date(), NaiveDate::from_ymd_opt(2025, 9, 1));
        assert_eq!(record.source_id(), "report.pdf");
    }

    #[test]
    fn test_outcomes_follow_request_order() {
        let extraction =
            Extractor::default().extract_detailed("r", REPORT, &["Hb", "HbA1c", "hba1c"]);
        let labels: Vec<(&str, &str)> = extraction
            .outcomes
            .iter()
            .map(|o| (o.field(), o.label()))
            .collect();
        assert_eq!(labels, vec![("Hb", "missing"), ("HbA1c", "matched")]);
        assert_eq!(extraction.found_count(), 1);
        assert!(extraction.date_found());
    }

    #[test]
    fn test_requested_spelling_is_the_key() {
        let record = extract_record("r", REPORT, &["hba1c"]);
        assert_eq!(record.numeric("hba1c"), Some(6.8));
        assert!(record.get("HbA1c").is_none());
    }

    #[test]
    fn test_requested_names_are_trimmed() {
        let record = extract_record("r", REPORT, &["HbA1c", " Glucose", "glucose ", " "]);
        let keys: Vec<&str> = record.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Glucose", "HbA1c"]);
    }

    #[test]
    fn test_negative_value_after_spaced_label() {
        let record = extract_record("r", "Base Excess -2.5 mmol/L", &["Base Excess"]);
        assert_eq!(record.get("Base Excess"), Some(&FieldValue::Numeric(-2.5)));
        let record = extract_record("r", "Base Excess - 2.5 mmol/L", &["Base Excess"]);
        assert_eq!(record.numeric("Base Excess"), Some(2.5));
        let record = extract_record("r", "Base Excess: -2.5", &["Base Excess"]);
        assert_eq!(record.numeric("Base Excess"), Some(-2.5));
    }

    #[test]
    fn test_coercion_fallback_outcome() {
        let extraction = Extractor::default().extract_detailed("r", "PSA: Pending", &["PSA"]);
        assert_eq!(
            extraction.outcomes,
            vec![FieldOutcome::CoercionFallback {
                field: "PSA".to_string(),
                candidate: 2,
                raw: "Pending".to_string(),
            }]
        );
        assert_eq!(
            extraction.record.get("PSA"),
            Some(&FieldValue::Raw("Pending".to_string()))
        );
    }

    #[test]
    fn test_empty_text_yields_empty_record() {
        let record = extract_record("blank.txt", "", &["HbA1c", "Glucose"]);
        assert!(record.is_empty());
        assert_eq!(record.observed_date(), None);
    }

    #[test]
    fn test_custom_registry() {
        let registry = FieldPatternRegistry::new();
        let locator = DateLocator::new();
        let extractor = Extractor::new(&registry, &locator);
        let record = extractor.extract("r", "HbA1c: 7.1 Ferritin 88", &["HbA1c", "Ferritin"]);
        assert_eq!(record.numeric("HbA1c"), Some(7.1));
        assert_eq!(record.numeric("Ferritin"), Some(88.0));
    }
}
