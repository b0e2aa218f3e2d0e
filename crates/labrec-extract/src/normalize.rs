//! Whitespace normalization for text recovered from documents.
//!
//! PDF text extraction reflows columns and wraps lines unpredictably, so a
//! label and its value may be separated by newlines, tabs or runs of spaces.
//! Collapsing every whitespace run to a single space lets the field and date
//! patterns treat the document as one line.

/// Collapse every run of whitespace into a single ASCII space.
///
/// Whitespace is anything with the Unicode `White_Space` property, which
/// includes newlines, tabs and non-breaking spaces. Case and all other
/// characters are left untouched.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

/// Returns true if `text` contains no whitespace other than single spaces.
pub fn is_normalized(text: &str) -> bool {
    let mut previous_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if ch != ' ' || previous_space {
                return false;
            }
            previous_space = true;
        } else {
            previous_space = false;
        }
    }
    true
}
