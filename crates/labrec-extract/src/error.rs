//! Error types for registry construction and configuration loading.
//!
//! Extraction itself never fails; these errors only arise while building a
//! pattern registry from user-supplied rules.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while compiling field rules.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The pattern is not a valid regular expression.
    #[error("invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// The pattern compiles but captures nothing.
    #[error("pattern for field '{field}' has no capture group: {pattern}")]
    MissingCapture { field: String, pattern: String },

    /// A rule was declared without any patterns.
    #[error("rule for field '{field}' has no patterns")]
    EmptyRule { field: String },
}

/// Errors raised while loading an extractor configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A configured rule could not be compiled.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::MissingCapture {
            field: "Vitamin D".to_string(),
            pattern: r"vitamin d \d+".to_string(),
        };
        assert_eq!(
            err.to_string(),
            r"pattern for field 'Vitamin D' has no capture group: vitamin d \d+"
        );
    }

    #[test]
    fn test_registry_error_into_config_error() {
        let err: ConfigError = RegistryError::EmptyRule {
            field: "TSH".to_string(),
        }
        .into();
        assert!(matches!(err, ConfigError::Registry(_)));
        assert_eq!(err.to_string(), "rule for field 'TSH' has no patterns");
    }
}
