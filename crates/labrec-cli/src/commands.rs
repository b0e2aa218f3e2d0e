use std::path::Path;

use anyhow::{Context, Result};
use labrec_extract::{
    Extractor, ExtractorConfig, FieldPatternRegistry, TrendSeries, default_locator,
};
use labrec_ingest::{CsvImport, expand_inputs, load_csv_records};
use tracing::{info, info_span};

use labrec_cli::pipeline::{DocumentOutcome, process_documents, successful_records};

use crate::cli::{DocumentArgs, ImportCsvArgs};

/// Configuration and the registry built from it.
pub struct Setup {
    pub config: ExtractorConfig,
    pub registry: FieldPatternRegistry,
}

impl Setup {
    /// Load the configuration file, if any, and build the field registry.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ExtractorConfig::load(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => ExtractorConfig::default(),
        };
        let registry = config.build_registry().context("build field rules")?;
        Ok(Self { config, registry })
    }

    pub fn extractor(&self) -> Extractor<'_> {
        Extractor::new(&self.registry, default_locator())
    }

    /// Fields named on the command line, else the configured defaults.
    pub fn fields(&self, requested: &[String]) -> Vec<String> {
        let requested: Vec<String> = requested
            .iter()
            .map(|field| field.as_str().trim())
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect();
        if requested.is_empty() {
            self.config.requested_fields()
        } else {
            requested
        }
    }
}

/// Documents processed by `extract`.
pub struct ExtractResult {
    pub fields: Vec<String>,
    pub outcomes: Vec<DocumentOutcome>,
}

/// Records ordered by `trend`, with the documents that could not be read.
pub struct TrendResult {
    pub fields: Vec<String>,
    pub series: TrendSeries,
    pub failures: Vec<DocumentOutcome>,
}

pub fn run_extract(args: &DocumentArgs, setup: &Setup) -> Result<ExtractResult> {
    let fields = setup.fields(&args.fields);
    let documents = expand_inputs(&args.paths).context("collect input documents")?;
    let span = info_span!("extract", documents = documents.len(), fields = fields.len());
    let _guard = span.enter();
    info!("extracting fields");
    let outcomes = process_documents(&documents, &fields, &setup.extractor());
    Ok(ExtractResult { fields, outcomes })
}

pub fn run_trend(args: &DocumentArgs, setup: &Setup) -> Result<TrendResult> {
    let ExtractResult { fields, outcomes } = run_extract(args, setup)?;
    let series = TrendSeries::new(successful_records(&outcomes));
    let failures = outcomes
        .into_iter()
        .filter(|outcome| outcome.result.is_err())
        .collect();
    Ok(TrendResult {
        fields,
        series,
        failures,
    })
}

pub fn run_import_csv(args: &ImportCsvArgs) -> Result<CsvImport> {
    let span = info_span!("import_csv", file = %args.file.display());
    let _guard = span.enter();
    load_csv_records(&args.file).with_context(|| format!("import {}", args.file.display()))
}

/// Field names present in any imported record, in the standard panel order
/// first and then alphabetically.
pub fn imported_fields(import: &CsvImport) -> Vec<String> {
    let mut fields: Vec<String> = labrec_model::DEFAULT_FIELDS
        .iter()
        .filter(|field| {
            import
                .records
                .iter()
                .any(|record| record.get(field).is_some())
        })
        .map(|field| (*field).to_string())
        .collect();
    let mut extra: Vec<String> = import
        .records
        .iter()
        .flat_map(|record| record.fields().keys())
        .filter(|name| !fields.contains(name))
        .cloned()
        .collect();
    extra.sort();
    extra.dedup();
    fields.extend(extra);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::cli::OutputFormatArg;

    #[test]
    fn test_setup_defaults() {
        let setup = Setup::load(None).unwrap();
        assert_eq!(setup.fields(&[]).len(), labrec_model::DEFAULT_FIELDS.len());
        assert_eq!(setup.fields(&["TSH".to_string()]), vec!["TSH"]);
    }

    #[test]
    fn test_setup_trims_field_names() {
        let setup = Setup::load(None).unwrap();
        let requested = ["HbA1c".to_string(), " Glucose".to_string(), " ".to_string()];
        assert_eq!(setup.fields(&requested), vec!["HbA1c", "Glucose"]);
    }

    #[test]
    fn test_setup_reports_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labrec.toml");
        std::fs::write(&path, "[[rules]]\nfield = \"TSH\"\npatterns = ['tsh (']\n").unwrap();
        let error = Setup::load(Some(&path)).err().unwrap();
        assert_eq!(error.to_string(), "build field rules");
    }

    #[test]
    fn test_trend_separates_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "HbA1c 6.1 Reported On: 01/08/2025").unwrap();
        std::fs::write(dir.path().join("b.txt"), "HbA1c 6.8 Reported On: 01/09/2025").unwrap();
        let args = DocumentArgs {
            paths: vec![dir.path().to_path_buf(), PathBuf::from("missing.pdf")],
            fields: vec!["HbA1c".to_string()],
            format: OutputFormatArg::Table,
        };
        let result = run_trend(&args, &Setup::load(None).unwrap()).unwrap();
        assert_eq!(result.series.len(), 2);
        assert_eq!(result.failures.len(), 1);
        assert!((result.series.latest_change()["HbA1c"] - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_imported_fields_order() {
        let import = labrec_ingest::read_csv_records(
            "Date,Vitamin D,Glucose,HbA1c\n01/09/2025,31,142,\n".as_bytes(),
            "pasted",
        )
        .unwrap();
        assert_eq!(imported_fields(&import), vec!["Glucose", "Vitamin D"]);
    }
}
