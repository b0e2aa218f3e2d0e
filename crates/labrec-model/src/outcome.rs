//! Per-field extraction outcomes.
//!
//! None of these are errors. They describe why a requested field is present,
//! present as text, or absent in the resulting record.

use serde::{Deserialize, Serialize};

/// What happened to one requested field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FieldOutcome {
    /// A pattern candidate matched and the capture coerced to a number.
    Matched {
        field: String,
        /// Index of the winning candidate in the field's rule.
        candidate: usize,
    },
    /// A candidate matched but the capture was kept as text.
    CoercionFallback {
        field: String,
        candidate: usize,
        raw: String,
    },
    /// No candidate matched; the field is absent from the record.
    NoMatch { field: String },
}

impl FieldOutcome {
    /// Name of the field this outcome refers to.
    pub fn field(&self) -> &str {
        match self {
            Self::Matched { field, .. }
            | Self::CoercionFallback { field, .. }
            | Self::NoMatch { field } => field,
        }
    }

    /// Returns true when the field ended up in the record.
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NoMatch { .. })
    }

    /// Short label for summaries.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Matched { .. } => "matched",
            Self::CoercionFallback { .. } => "text",
            Self::NoMatch { .. } => "missing",
        }
    }
}
