//! Document date recognition.
//!
//! Dates are located independently of field extraction, so a report with no
//! recognizable field still yields a dated record.
//!
//! # Precedence
//!
//! Labeled patterns are tried in order ("received on", "reported on",
//! "collected on", a bare "date" label) and unlabeled date tokens last, since
//! those are the most likely to be something else that happens to look like
//! a date. A pattern wins only when its match is also a valid calendar date.
//!
//! # Accepted tokens
//!
//! - `DD/MM/YYYY`, `DD-MM-YYYY` (day first, one or two digit day and month)
//! - two-digit years: `00`-`69` map to 20xx, `70`-`99` to 19xx
//! - ISO `YYYY-MM-DD`

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};

/// Date token shapes; the separator must repeat.
const DATE_TOKEN: &str = r"(?P<date>\d{4}-\d{1,2}-\d{1,2}\b|\d{1,2}/\d{1,2}/(?:\d{4}|\d{2})\b|\d{1,2}-\d{1,2}-(?:\d{4}|\d{2})\b)";

/// Label patterns in precedence order, paired with a short name.
const LABELED_PATTERNS: &[(&str, &str)] = &[
    ("received", r"\b(?:received|registered)(?:\s+on|\s+date|\s+at)?"),
    (
        "reported",
        r"\b(?:reported(?:\s+on|\s+date)?|report(?:ing)?\s+date)",
    ),
    (
        "collected",
        r"\b(?:collected(?:\s+on|\s+date|\s+at)?|collection\s+date|sample\s+date|sampled\s+on)",
    ),
    (
        "date",
        r"\bdate(?:\s+of\s+(?:report|collection|sample|test|receipt))?",
    ),
];

/// Text that disqualifies an unlabeled date token directly after it.
const BIRTH_CONTEXT: &str = r"(?:\bbirth|\bdob|\bd\.o\.b\.?)\W{0,5}$";

/// Name of the unlabeled fallback pattern.
pub const BARE_PATTERN: &str = "bare";

/// A located document date and the pattern that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub pattern: &'static str,
}

#[derive(Debug, Clone)]
struct DatePattern {
    name: &'static str,
    regex: Regex,
    exclude_before: Option<Regex>,
}

impl DatePattern {
    fn excludes(&self, preceding: &str) -> bool {
        self.exclude_before
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(preceding))
    }
}

/// Ordered date recognizer.
#[derive(Debug, Clone)]
pub struct DateLocator {
    patterns: Vec<DatePattern>,
}

impl DateLocator {
    /// Builds the locator with the built-in label precedence.
    ///
    /// # Panics
    ///
    /// Panics if a built-in pattern fails to compile.
    pub fn new() -> Self {
        let mut patterns: Vec<DatePattern> = LABELED_PATTERNS
            .iter()
            .map(|&(name, label)| DatePattern {
                name,
                regex: build(&format!(r"{label}\s*[:\-]?\s*{DATE_TOKEN}")),
                exclude_before: None,
            })
            .collect();
        patterns.push(DatePattern {
            name: BARE_PATTERN,
            regex: build(&format!(r"\b{DATE_TOKEN}")),
            exclude_before: Some(build(BIRTH_CONTEXT)),
        });
        Self { patterns }
    }

    /// Locate the document date in `text`, if any.
    pub fn locate(&self, text: &str) -> Option<NaiveDate> {
        self.locate_detailed(text).map(|found| found.date)
    }

    /// Like [`locate`](Self::locate) but also reports which pattern won.
    pub fn locate_detailed(&self, text: &str) -> Option<DateMatch> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .regex
                .captures_iter(text)
                .filter_map(|caps| caps.name("date"))
                .filter(|token| !pattern.excludes(&text[..token.start()]))
                .find_map(|token| parse_date_token(token.as_str()))
                .map(|date| DateMatch {
                    date,
                    pattern: pattern.name,
                })
        })
    }

    /// Pattern names in precedence order.
    pub fn pattern_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.patterns.iter().map(|pattern| pattern.name)
    }
}

impl Default for DateLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn build(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("Invalid date pattern")
}

static DEFAULT_LOCATOR: OnceLock<DateLocator> = OnceLock::new();

/// Returns the process-wide date locator, built on first access.
pub fn default_locator() -> &'static DateLocator {
    DEFAULT_LOCATOR.get_or_init(DateLocator::new)
}

/// Parse a single date token (`DD/MM/YYYY`, `DD-MM-YY`, `YYYY-MM-DD`, ...).
///
/// Returns `None` for malformed tokens and impossible calendar dates.
pub fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let token = token.trim();
    let separator = token.chars().find(|c| *c == '/' || *c == '-')?;
    let parts: Vec<&str> = token.split(separator).collect();
    let [first, second, third] = parts.as_slice() else {
        return None;
    };
    if first.len() == 4 {
        if separator != '-' {
            return None;
        }
        return NaiveDate::from_ymd_opt(
            first.parse().ok()?,
            second.parse().ok()?,
            third.parse().ok()?,
        );
    }
    let day: u32 = first.parse().ok()?;
    let month: u32 = second.parse().ok()?;
    let year = expand_year(third)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn expand_year(year: &str) -> Option<i32> {
    let value: i32 = year.parse().ok()?;
    match year.len() {
        4 => Some(value),
        2 if value < 70 => Some(2000 + value),
        2 => Some(1900 + value),
        _ => None,
    }
}
