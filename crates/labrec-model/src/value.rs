//! Typed field values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value extracted for one field.
///
/// Numeric readings are always finite. When the captured text does not parse
/// as a number the original text is kept as [`FieldValue::Raw`], so callers can
/// tell "95.0 read as a number" apart from "95.0 kept as text".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Successfully coerced numeric reading.
    Numeric(f64),
    /// Captured text that could not be coerced.
    Raw(String),
}

impl FieldValue {
    /// Returns true when the value was coerced to a number.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }

    /// Returns the numeric reading, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(*value),
            Self::Raw(_) => None,
        }
    }

    /// Returns the raw text, if coercion fell back.
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Self::Numeric(_) => None,
            Self::Raw(text) => Some(text),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value}"),
            Self::Raw(text) => write!(f, "{text}"),
        }
    }
}
