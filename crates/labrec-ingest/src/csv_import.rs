//! Bulk import of lab values from comma-separated rows.
//!
//! Each row is one dated reading set:
//!
//! ```text
//! Date,HbA1c,Glucose,Hb,Platelet,WBC,ESR,ALT,AST,Calcium,PSA
//! 01/08/2025,6.1,118,14.2,250000,7000,10,30,25,9.5,1.2
//! ```
//!
//! The header row is optional. When the first cell of the first row is
//! `Date`, the columns are taken from that row; otherwise the column order
//! above is assumed. Rows with a bad date or the wrong number of cells are
//! skipped and reported, never fatal.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use labrec_extract::{coerce, parse_date_token};
use labrec_model::{DEFAULT_FIELDS, ExtractionRecord};
use tracing::{info, warn};

use crate::error::{IngestError, Result};

/// Name of the leading date column.
pub const DATE_COLUMN: &str = "Date";

/// A row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the input.
    pub line: u64,
    pub reason: String,
}

/// Result of a CSV import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvImport {
    /// Imported records in input order.
    pub records: Vec<ExtractionRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Reads records from CSV text.
///
/// `source_label` names the input in errors and record ids; each record's
/// id is `"{source_label}:{line}"`.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if the input cannot be read as CSV at all.
/// Individual bad rows are reported in [`CsvImport::skipped`] instead.
pub fn read_csv_records<R: Read>(reader: R, source_label: &str) -> Result<CsvImport> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut columns: Option<Vec<String>> = None;
    let mut import = CsvImport::default();

    for row in csv_reader.records() {
        let row = row.map_err(|source| IngestError::Csv {
            label: source_label.to_string(),
            source,
        })?;
        let line = row.position().map_or(0, csv::Position::line);

        if columns.is_none() {
            let is_header = row
                .get(0)
                .is_some_and(|cell| cell.eq_ignore_ascii_case(DATE_COLUMN));
            columns = Some(if is_header {
                row.iter().skip(1).map(str::to_string).collect()
            } else {
                DEFAULT_FIELDS.iter().map(|f| (*f).to_string()).collect()
            });
            if is_header {
                continue;
            }
        }
        let Some(columns) = columns.as_deref() else {
            continue;
        };

        match parse_row(&row, columns, source_label, line) {
            Ok(record) => import.records.push(record),
            Err(reason) => {
                warn!(source = source_label, line, %reason, "skipping CSV row");
                import.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    info!(
        source = source_label,
        imported = import.records.len(),
        skipped = import.skipped.len(),
        "CSV import finished"
    );
    Ok(import)
}

fn parse_row(
    row: &StringRecord,
    columns: &[String],
    source_label: &str,
    line: u64,
) -> std::result::Result<ExtractionRecord, String> {
    if row.iter().all(str::is_empty) {
        return Err("empty row".to_string());
    }
    let expected = columns.len() + 1;
    if row.len() != expected {
        return Err(format!("expected {expected} columns, found {}", row.len()));
    }
    let date_cell = row.get(0).unwrap_or_default();
    let date = parse_date_token(date_cell).ok_or_else(|| "unparseable date".to_string())?;

    let fields: BTreeMap<_, _> = columns
        .iter()
        .zip(row.iter().skip(1))
        .filter(|(name, cell)| !name.is_empty() && !cell.is_empty())
        .map(|(name, cell)| (name.clone(), coerce(cell)))
        .collect();

    Ok(ExtractionRecord::new(
        format!("{source_label}:{line}"),
        Some(date),
        fields,
    ))
}

/// Reads records from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read as CSV.
pub fn load_csv_records(path: &Path) -> Result<CsvImport> {
    let file = File::open(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let label = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    read_csv_records(file, &label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use labrec_model::FieldValue;

    #[test]
    fn test_headerless_rows_use_default_columns() {
        let input = "01/08/2025,6.1,118,14.2,250000,7000,10,30,25,9.5,1.2\n";
        let import = read_csv_records(input.as_bytes(), "pasted").unwrap();
        assert!(import.skipped.is_empty());
        let record = &import.records[0];
        assert_eq!(record.source_id(), "pasted:1");
        assert_eq!(record.numeric("HbA1c"), Some(6.1));
        assert_eq!(record.numeric("PSA"), Some(1.2));
        assert_eq!(record.fields().len(), DEFAULT_FIELDS.len());
    }

    #[test]
    fn test_header_maps_columns_by_name() {
        let input = "date, Glucose ,HbA1c\n01/09/2025,142,6.8\n";
        let import = read_csv_records(input.as_bytes(), "pasted").unwrap();
        let record = &import.records[0];
        assert_eq!(record.source_id(), "pasted:2");
        assert_eq!(record.numeric("Glucose"), Some(142.0));
        assert_eq!(record.numeric("HbA1c"), Some(6.8));
    }

    #[test]
    fn test_empty_and_text_cells() {
        let input = "Date,HbA1c,PSA,Hb\n01/09/2025,,Pending,13.8\n";
        let import = read_csv_records(input.as_bytes(), "pasted").unwrap();
        let record = &import.records[0];
        assert!(record.get("HbA1c").is_none());
        assert_eq!(
            record.get("PSA"),
            Some(&FieldValue::Raw("Pending".to_string()))
        );
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let input = "\
Date,HbA1c,Glucose
01/08/2025,6.1,118
not-a-date,6.5,120
01/09/2025,6.8
31/02/2025,7.0,130
01/10/2025,7.2,150
";
        let import = read_csv_records(input.as_bytes(), "pasted").unwrap();
        assert_eq!(import.records.len(), 2);
        let lines: Vec<u64> = import.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert_eq!(import.skipped[1].reason, "expected 3 columns, found 2");
        assert_eq!(import.skipped[0].reason, "unparseable date");
    }

    #[test]
    fn test_empty_input() {
        let import = read_csv_records("".as_bytes(), "pasted").unwrap();
        assert!(import.records.is_empty());
        assert!(import.skipped.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_csv_records(Path::new("/nonexistent/values.csv")).unwrap_err();
        assert!(matches!(err, IngestError::FileRead { .. }));
    }
}
