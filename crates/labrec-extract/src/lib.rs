//! Field and date extraction from lab report text.
//!
//! The pipeline for one document is pure and synchronous:
//!
//! 1. [`normalize`] collapses whitespace so labels split across PDF lines
//!    still match.
//! 2. For each requested field, the [`FieldPatternRegistry`] supplies an
//!    ordered list of candidates; the first one that matches wins.
//! 3. [`coerce`] turns the captured text into a number, keeping the text
//!    when that fails.
//! 4. [`DateLocator`] finds the document date independently of the fields.
//!
//! [`sort_for_trend`] and [`TrendSeries`] order finished records for a
//! time-series view. [`ExtractorConfig`] loads additional field rules from
//! TOML.

pub mod coerce;
pub mod config;
pub mod date;
pub mod error;
pub mod extractor;
pub mod normalize;
pub mod registry;
pub mod trend;

pub use coerce::{coerce, parse_numeric};
pub use config::{CustomRule, ExtractorConfig};
pub use date::{DateLocator, DateMatch, default_locator, parse_date_token};
pub use error::{ConfigError, RegistryError};
pub use extractor::{Extraction, Extractor, extract_record};
pub use normalize::{is_normalized, normalize};
pub use registry::{
    FieldPatternRegistry, FieldRule, PatternCandidate, RuleMatch, VALUE_TOKEN, default_registry,
};
pub use trend::{TrendSeries, sort_for_trend};
