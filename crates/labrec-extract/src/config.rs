//! Extractor configuration loaded from TOML.
//!
//! ```toml
//! # Default fields to request when none are given on the command line.
//! fields = ["HbA1c", "Glucose", "Vitamin D"]
//!
//! [[rules]]
//! field = "Vitamin D"
//! patterns = ['\b25[- ]?oh\s+vitamin\s+d\b\s*[:\-]?\s*{value}']
//!
//! [[rules]]
//! field = "Glucose"
//! patterns = ['\bplasma\s+glucose\s+f\b\s*{value}']
//! replace = false
//! ```
//!
//! User patterns for a curated field are tried before the curated ones;
//! `replace = true` discards the curated candidates instead.

use std::path::Path;

use labrec_model::DEFAULT_FIELDS;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, RegistryError};
use crate::registry::{FieldPatternRegistry, FieldRule, PatternCandidate};

/// A user-supplied rule for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    /// Field name the patterns recognize.
    pub field: String,
    /// Patterns in priority order. `{value}` expands to the standard value token.
    pub patterns: Vec<String>,
    /// Replace the curated candidates instead of going ahead of them.
    #[serde(default)]
    pub replace: bool,
}

/// Extractor settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Fields requested when the caller does not name any.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Additional or overriding field rules.
    #[serde(default)]
    pub rules: Vec<CustomRule>,
}

impl ExtractorConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            path = %path.display(),
            fields = config.fields.len(),
            rules = config.rules.len(),
            "loaded extractor config"
        );
        Ok(config)
    }

    /// Fields to request by default: the configured list, or the standard
    /// intake fields when none are configured.
    pub fn requested_fields(&self) -> Vec<String> {
        if self.fields.is_empty() {
            DEFAULT_FIELDS.iter().map(|f| (*f).to_string()).collect()
        } else {
            self.fields.clone()
        }
    }

    /// Build a registry from the curated rules plus this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid, lacks a capture group, or a
    /// rule has no patterns.
    pub fn build_registry(&self) -> Result<FieldPatternRegistry, RegistryError> {
        let mut registry = FieldPatternRegistry::curated();
        for rule in &self.rules {
            if rule.patterns.is_empty() {
                return Err(RegistryError::EmptyRule {
                    field: rule.field.clone(),
                });
            }
            let candidates = rule
                .patterns
                .iter()
                .map(|pattern| PatternCandidate::new(&rule.field, pattern, rule.field.as_str()))
                .collect::<Result<Vec<_>, _>>()?;
            if rule.replace {
                registry.register(FieldRule::new(rule.field.as_str(), candidates));
            } else {
                registry.prepend(&rule.field, candidates);
            }
        }
        Ok(registry)
    }
}
