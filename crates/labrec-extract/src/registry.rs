//! Field pattern registry.
//!
//! Each canonical field maps to a [`FieldRule`]: an ordered list of
//! [`PatternCandidate`]s, most specific (vendor-tagged) first and most
//! generic last. Lab vendors label the same analyte in many ways
//! ("HbA1c", "Glycated Haemoglobin", "A1c"), so a single pattern per field
//! produces systematic misses on any report it was not written against.
//!
//! Fields without a curated entry fall back to a generic rule built from the
//! field name itself.
//!
//! # Thread Safety
//!
//! A registry is immutable once built and can be shared across threads. The
//! process-wide default is cached in a [`OnceLock`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::error::RegistryError;

/// Capture shape for a field value.
///
/// A number (optional comparator and sign, comma digit groups, optional
/// decimals) or one of the qualitative results labs print instead of a
/// number. The group is always named `value`.
pub const VALUE_TOKEN: &str = r"(?P<value>(?:[<>]=?\s*)?[-+]?\d+(?:,\d{2,3})*(?:\.\d+)?|(?:pending|awaited|nil|negative|positive|not\s+detected|detected|non[-\s]?reactive|reactive|trace)\b)";

/// Units that may sit in parentheses between a label and its value.
const UNIT_TOKEN: &str = r"%|g/dl|gm/dl|gm%|g/l|mg/dl|mmol/l|mmol/mol|u/l|iu/l|ng/ml|mm/hr|mm/1st\s*hr|/cumm|cells/cumm|/[uµμ]l|/mm3|10\^3/[uµμ]l|x\s*10\^9/l|lakhs?/cumm";

/// Placeholder user patterns may use to stand for [`VALUE_TOKEN`].
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// Glue between a label and its value: optional unit, optional `:`/`=`.
///
/// A dash only separates when whitespace follows it; otherwise it is the
/// value's sign.
fn label_link() -> String {
    format!(r"\s*(?:\(\s*(?:{UNIT_TOKEN})\s*\)\s*)?(?:[:=]|-\s)?\s*")
}

fn compile(field: &str, pattern: &str) -> Result<Regex, RegistryError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| RegistryError::InvalidPattern {
            field: field.to_string(),
            source,
        })
}

// =============================================================================
// Pattern candidates
// =============================================================================

/// One recognizer for a field: label text plus a value capture.
#[derive(Debug, Clone)]
pub struct PatternCandidate {
    regex: Regex,
    example: String,
    exclude_before: Option<Regex>,
}

impl PatternCandidate {
    /// Compile a full pattern.
    ///
    /// `{value}` in the pattern is replaced with [`VALUE_TOKEN`]. The pattern
    /// must contain a capture group; the group named `value` is used when
    /// present, otherwise the first group.
    pub fn new(
        field: &str,
        pattern: &str,
        example: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let expanded = pattern.replace(VALUE_PLACEHOLDER, VALUE_TOKEN);
        let regex = compile(field, &expanded)?;
        if regex.captures_len() < 2 {
            return Err(RegistryError::MissingCapture {
                field: field.to_string(),
                pattern: pattern.to_string(),
            });
        }
        Ok(Self {
            regex,
            example: example.into(),
            exclude_before: None,
        })
    }

    /// Compile a label pattern followed by the standard unit/separator glue
    /// and [`VALUE_TOKEN`].
    pub fn labeled(
        field: &str,
        label: &str,
        example: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let pattern = format!("(?:{label}){}{VALUE_TOKEN}", label_link());
        Self::new(field, &pattern, example)
    }

    /// Reject matches whose preceding text ends with `context`.
    ///
    /// Used where a label is a suffix of a different analyte, for example
    /// "Haemoglobin" inside "Glycated Haemoglobin".
    pub fn excluding_after(mut self, field: &str, context: &str) -> Result<Self, RegistryError> {
        self.exclude_before = Some(compile(field, &format!(r"(?:{context})\s*$"))?);
        Ok(self)
    }

    /// Example label text this candidate recognizes.
    pub fn example(&self) -> &str {
        &self.example
    }

    /// Source of the compiled pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Return the captured value of the first acceptable match in `text`.
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        for caps in self.regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if let Some(exclude) = &self.exclude_before
                && exclude.is_match(&text[..whole.start()])
            {
                continue;
            }
            if let Some(value) = caps.name("value").or_else(|| caps.get(1)) {
                return Some(value.as_str());
            }
        }
        None
    }
}

// =============================================================================
// Field rules
// =============================================================================

/// A successful match of a [`FieldRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'t> {
    /// Index of the candidate that matched.
    pub candidate: usize,
    /// Captured value text.
    pub raw: &'t str,
}

/// Ordered recognition strategies for one canonical field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: String,
    candidates: Vec<PatternCandidate>,
}

impl FieldRule {
    /// Creates a rule from ordered candidates.
    pub fn new(field: impl Into<String>, candidates: Vec<PatternCandidate>) -> Self {
        Self {
            field: field.into(),
            candidates,
        }
    }

    /// Synthesizes the generic rule for a field without a curated entry:
    /// the field name as label, then the standard glue and value token.
    pub fn generic(field: &str) -> Result<Self, RegistryError> {
        let name = field.trim();
        if name.is_empty() {
            return Ok(Self::new(field, Vec::new()));
        }
        let lead = if name.starts_with(is_word_char) { r"\b" } else { "" };
        let trail = if name.ends_with(is_word_char) { r"\b" } else { "" };
        let label = regex::escape(name).replace(' ', r"\s+");
        let candidate = PatternCandidate::labeled(field, &format!("{lead}{label}{trail}"), name)?;
        Ok(Self::new(field, vec![candidate]))
    }

    /// Canonical field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Candidates in priority order.
    pub fn candidates(&self) -> &[PatternCandidate] {
        &self.candidates
    }

    /// Try candidates in order; the first one that matches is authoritative.
    pub fn find<'t>(&self, text: &'t str) -> Option<RuleMatch<'t>> {
        self.candidates
            .iter()
            .enumerate()
            .find_map(|(candidate, pattern)| {
                pattern
                    .capture(text)
                    .map(|raw| RuleMatch { candidate, raw })
            })
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

// =============================================================================
// Registry
// =============================================================================

/// Registry of field rules indexed by case-insensitive field name.
#[derive(Debug, Clone, Default)]
pub struct FieldPatternRegistry {
    rules: Vec<FieldRule>,
    index: HashMap<String, usize>,
}

impl FieldPatternRegistry {
    /// Creates an empty registry (every lookup uses the generic rule).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the curated clinical field rules.
    ///
    /// # Panics
    ///
    /// Panics if a built-in pattern fails to compile.
    pub fn curated() -> Self {
        let mut registry = Self::new();
        for (field, candidates) in CURATED_RULES {
            let compiled = candidates
                .iter()
                .map(|candidate| candidate.compile(field))
                .collect::<Result<Vec<_>, _>>()
                .expect("Invalid curated field pattern");
            registry.register(FieldRule::new(*field, compiled));
        }
        registry
    }

    /// Registers a rule, replacing any rule with the same name.
    pub fn register(&mut self, rule: FieldRule) {
        let key = index_key(rule.field());
        match self.index.get(&key) {
            Some(&position) => self.rules[position] = rule,
            None => {
                self.index.insert(key, self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    /// Puts `candidates` ahead of the existing ones for `field`, or registers
    /// them as a new rule.
    pub fn prepend(&mut self, field: &str, candidates: Vec<PatternCandidate>) {
        match self.index.get(&index_key(field)) {
            Some(&position) => {
                let rule = &mut self.rules[position];
                let existing = std::mem::take(&mut rule.candidates);
                rule.candidates = candidates.into_iter().chain(existing).collect();
            }
            None => self.register(FieldRule::new(field, candidates)),
        }
    }

    /// Gets the curated or registered rule for a field.
    pub fn get(&self, field: &str) -> Option<&FieldRule> {
        self.index
            .get(&index_key(field))
            .map(|&position| &self.rules[position])
    }

    /// Gets the rule for a field, synthesizing the generic rule when the
    /// field is not registered.
    pub fn rules_for(&self, field: &str) -> Cow<'_, FieldRule> {
        if let Some(rule) = self.get(field) {
            return Cow::Borrowed(rule);
        }
        match FieldRule::generic(field) {
            Ok(rule) => Cow::Owned(rule),
            Err(error) => {
                warn!(field, %error, "could not build generic rule; field will not match");
                Cow::Owned(FieldRule::new(field, Vec::new()))
            }
        }
    }

    /// Registered field names in registration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.iter().map(FieldRule::field)
    }

    /// Registered rules in registration order.
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Returns the number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn index_key(field: &str) -> String {
    field.trim().to_uppercase()
}

/// Cached default registry with the curated rules.
static DEFAULT_REGISTRY: OnceLock<FieldPatternRegistry> = OnceLock::new();

/// Returns the process-wide curated registry, built on first access.
pub fn default_registry() -> &'static FieldPatternRegistry {
    DEFAULT_REGISTRY.get_or_init(FieldPatternRegistry::curated)
}

// =============================================================================
// Curated rules
// =============================================================================

struct CuratedCandidate {
    label: &'static str,
    example: &'static str,
    exclude_after: Option<&'static str>,
}

impl CuratedCandidate {
    fn compile(&self, field: &str) -> Result<PatternCandidate, RegistryError> {
        let candidate = PatternCandidate::labeled(field, self.label, self.example)?;
        match self.exclude_after {
            Some(context) => candidate.excluding_after(field, context),
            None => Ok(candidate),
        }
    }
}

const fn label(label: &'static str, example: &'static str) -> CuratedCandidate {
    CuratedCandidate {
        label,
        example,
        exclude_after: None,
    }
}

const fn label_not_after(
    label: &'static str,
    example: &'static str,
    context: &'static str,
) -> CuratedCandidate {
    CuratedCandidate {
        label,
        example,
        exclude_after: Some(context),
    }
}

const NOT_HB: &str = r"glyc(?:ated|osylated)|corpuscular|mean\s+cell";

/// Curated fields with known label variance, most specific candidate first.
const CURATED_RULES: &[(&str, &[CuratedCandidate])] = &[
    (
        "HbA1c",
        &[
            label(
                r"\bglyc(?:ated|osylated)\s+ha?emoglobin(?:\s*\(\s*hb\s*a1c\s*\))?",
                "Glycated Haemoglobin (HbA1c)",
            ),
            label(r"\bhba1c\b", "HbA1c"),
            label(r"\b(?:hb\s+a1c|a1c)\b", "A1c"),
        ],
    ),
    (
        "Glucose",
        &[
            label(
                r"\bfasting\s+(?:blood\s+|plasma\s+)?(?:glucose|sugar)\b(?:\s*\(\s*fbs\s*\))?",
                "Fasting Blood Sugar (FBS)",
            ),
            label(r"\bfbs\b", "FBS"),
            label(
                r"\b(?:random\s+(?:blood\s+|plasma\s+)?(?:glucose|sugar)|rbs)\b",
                "Random Blood Sugar",
            ),
            label(
                r"\b(?:blood\s+sugar|glucose)\b(?:\s*,?\s*(?:fasting|random|plasma|serum)\b)?",
                "Glucose",
            ),
        ],
    ),
    (
        "Hb",
        &[
            label_not_after(
                r"\bha?emoglobin\s*\(\s*(?:hb|hgb)\s*\)",
                "Haemoglobin (Hb)",
                NOT_HB,
            ),
            label_not_after(r"\bha?emoglobin\b", "Hemoglobin", NOT_HB),
            label_not_after(r"\b(?:hb|hgb)\b", "HGB", NOT_HB),
        ],
    ),
    (
        "Platelet",
        &[
            label(r"\bplatelet\s+count\b(?:\s*\(\s*plt\s*\))?", "Platelet Count"),
            label(r"\bplatelets?\b", "Platelets"),
            label(r"\bplt\b", "PLT"),
        ],
    ),
    (
        "WBC",
        &[
            label(
                r"\b(?:total\s+(?:wbc|leu[kc]ocyte)\s+count|tlc)\b",
                "Total Leucocyte Count",
            ),
            label(r"\b(?:wbc|white\s+blood\s+cells?)(?:\s+count)?\b", "WBC Count"),
            label(r"\bleu[kc]ocytes?\b", "Leukocytes"),
        ],
    ),
    (
        "ESR",
        &[
            label(
                r"\berythrocyte\s+sedimentation\s+rate\b(?:\s*\(\s*esr\s*\))?",
                "Erythrocyte Sedimentation Rate (ESR)",
            ),
            label(r"\besr\b", "ESR"),
        ],
    ),
    (
        "ALT",
        &[
            label(
                r"\balanine\s+(?:aminotransferase|aminotransaminase|transaminase)\b(?:\s*\(\s*(?:alt|sgpt)\s*\))?",
                "Alanine Aminotransferase (ALT)",
            ),
            label(r"\bsgpt\b(?:\s*[/(]\s*alt\b\s*\)?)?", "SGPT"),
            label(r"\balt\b(?:\s*[/(]\s*sgpt\b\s*\)?)?", "ALT (SGPT)"),
        ],
    ),
    (
        "AST",
        &[
            label(
                r"\baspartate\s+(?:aminotransferase|aminotransaminase|transaminase)\b(?:\s*\(\s*(?:ast|sgot)\s*\))?",
                "Aspartate Aminotransferase (AST)",
            ),
            label(r"\bsgot\b(?:\s*[/(]\s*ast\b\s*\)?)?", "SGOT"),
            label(r"\bast\b(?:\s*[/(]\s*sgot\b\s*\)?)?", "AST (SGOT)"),
        ],
    ),
    (
        "Calcium",
        &[
            label_not_after(
                r"\b(?:total\s+calcium|(?:serum\s+)?calcium\s*,?\s*total)\b",
                "Calcium, Total",
                r"ioni[sz]ed",
            ),
            label_not_after(r"\b(?:serum\s+)?calcium\b", "Serum Calcium", r"ioni[sz]ed"),
        ],
    ),
    (
        "PSA",
        &[
            label(
                r"\bprostate\s+specific\s+antigen\b(?:\s*\(\s*(?:total\s+)?psa\s*\))?",
                "Prostate Specific Antigen (PSA)",
            ),
            label(r"\btotal\s+psa\b", "Total PSA"),
            label_not_after(r"\bpsa\b(?:\s*,?\s*total\b)?", "PSA", r"free"),
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_registry_fields() {
        let registry = FieldPatternRegistry::curated();
        let names: Vec<&str> = registry.field_names().collect();
        assert_eq!(
            names,
            vec![
                "HbA1c", "Glucose", "Hb", "Platelet", "WBC", "ESR", "ALT", "AST", "Calcium",
                "PSA"
            ]
        );
        for rule in registry.rules() {
            let count = rule.candidates().len();
            assert!((2..=4).contains(&count), "{} has {count}", rule.field());
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = default_registry();
        assert_eq!(registry.get("hba1c").map(FieldRule::field), Some("HbA1c"));
        assert_eq!(registry.get(" psa ").map(FieldRule::field), Some("PSA"));
        assert!(registry.get("TSH").is_none());
    }

    #[test]
    fn test_rules_for_unknown_field_is_generic() {
        let registry = default_registry();
        let rule = registry.rules_for("Vitamin D");
        assert!(matches!(rule, Cow::Owned(_)));
        assert_eq!(rule.candidates().len(), 1);
        let found = rule.find("Vitamin D : 31.4 ng/mL").unwrap();
        assert_eq!(found.raw, "31.4");
    }

    #[test]
    fn test_generic_rule_keeps_thousands_separator() {
        let rule = FieldRule::generic("Ferritin").unwrap();
        assert_eq!(rule.find("Ferritin 1,250 ng/mL").unwrap().raw, "1,250");
    }

    #[test]
    fn test_generic_rule_respects_word_boundary() {
        let rule = FieldRule::generic("Hb").unwrap();
        assert!(rule.find("HbA1c 6.8").is_none());
    }

    #[test]
    fn test_generic_rule_for_empty_name_matches_nothing() {
        let rule = FieldRule::generic("  ").unwrap();
        assert!(rule.candidates().is_empty());
        assert!(rule.find("42").is_none());
    }

    #[test]
    fn test_unit_between_label_and_value() {
        let rule = default_registry().rules_for("Glucose");
        assert_eq!(rule.find("Glucose (mg/dL) 98").unwrap().raw, "98");
    }

    #[test]
    fn test_glycated_haemoglobin_is_not_hb() {
        let rule = default_registry().rules_for("Hb");
        assert!(rule.find("Glycated Haemoglobin 6.5 %").is_none());
        let found = rule.find("Glycated Haemoglobin 6.5 % Haemoglobin 12.9").unwrap();
        assert_eq!(found.raw, "12.9");
    }

    #[test]
    fn test_free_psa_is_not_total_psa() {
        let rule = default_registry().rules_for("PSA");
        assert!(rule.find("Free PSA 0.4").is_none());
    }

    #[test]
    fn test_qualitative_capture() {
        let rule = default_registry().rules_for("PSA");
        assert_eq!(rule.find("PSA: Pending").unwrap().raw, "Pending");
        assert_eq!(rule.find("PSA < 0.01 ng/mL").unwrap().raw, "< 0.01");
    }

    #[test]
    fn test_candidate_requires_capture_group() {
        let err = PatternCandidate::new("TSH", r"tsh \d+", "TSH").unwrap_err();
        assert!(matches!(err, RegistryError::MissingCapture { .. }));
    }

    #[test]
    fn test_candidate_value_placeholder() {
        let candidate = PatternCandidate::new("TSH", r"\btsh\b\s*{value}", "TSH").unwrap();
        assert_eq!(candidate.capture("TSH 2.5 uIU/mL"), Some("2.5"));
    }

    #[test]
    fn test_candidate_invalid_regex() {
        let err = PatternCandidate::new("TSH", r"tsh (\d+", "TSH").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPattern { .. }));
    }

    #[test]
    fn test_prepend_and_register() {
        let mut registry = FieldPatternRegistry::curated();
        let custom = PatternCandidate::new("Glucose", r"\bgluc\b\s*{value}", "Gluc").unwrap();
        registry.prepend("glucose", vec![custom]);
        let rule = registry.get("Glucose").unwrap();
        assert_eq!(rule.candidates().len(), 5);
        assert_eq!(rule.candidates()[0].example(), "Gluc");

        registry.register(FieldRule::new("Glucose", Vec::new()));
        assert!(registry.get("Glucose").unwrap().candidates().is_empty());
        assert_eq!(registry.len(), 10);
    }
}
