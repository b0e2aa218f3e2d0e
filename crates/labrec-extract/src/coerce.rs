//! Conversion of captured text to typed field values.

use labrec_model::FieldValue;

/// Parse a captured value as a finite base-10 number.
///
/// Handles:
/// - Standard numbers: "142", "-0.5", "6.8"
/// - Digit-group separators: "2,10,000", "1,234.5"
/// - Surrounding whitespace
///
/// Returns `None` for anything else, including "inf" and "NaN".
pub fn parse_numeric(value: &str) -> Option<f64> {
    let cleaned = value.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Coerce a captured value into a [`FieldValue`].
///
/// On failure the trimmed original text is preserved as
/// [`FieldValue::Raw`]; the variant itself tells the caller that coercion
/// fell back to text.
pub fn coerce(raw: &str) -> FieldValue {
    match parse_numeric(raw) {
        Some(number) => FieldValue::Numeric(number),
        None => FieldValue::Raw(raw.trim().to_string()),
    }
}
