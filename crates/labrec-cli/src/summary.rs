use std::collections::BTreeMap;

use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;

use labrec_cli::pipeline::{DocumentOutcome, summarize};
use labrec_extract::FieldPatternRegistry;
use labrec_ingest::CsvImport;
use labrec_model::{ExtractionRecord, FieldOutcome, FieldValue};

use crate::cli::OutputFormatArg;
use crate::commands::{ExtractResult, TrendResult, imported_fields};

// =============================================================================
// JSON output
// =============================================================================

#[derive(Serialize)]
struct DocumentJson<'a> {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a ExtractionRecord>,
    #[serde(skip_serializing_if = "no_outcomes")]
    outcomes: &'a [FieldOutcome],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn no_outcomes(outcomes: &&[FieldOutcome]) -> bool {
    outcomes.is_empty()
}

#[derive(Serialize)]
struct FailureJson {
    path: String,
    error: String,
}

#[derive(Serialize)]
struct TrendJson<'a> {
    records: &'a [ExtractionRecord],
    latest_change: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<FailureJson>,
}

#[derive(Serialize)]
struct SkippedJson {
    line: u64,
    reason: String,
}

#[derive(Serialize)]
struct ImportJson<'a> {
    records: &'a [ExtractionRecord],
    skipped: Vec<SkippedJson>,
}

fn documents_json(outcomes: &[DocumentOutcome]) -> Vec<DocumentJson<'_>> {
    outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(extraction) => DocumentJson {
                path: outcome.path.display().to_string(),
                record: Some(&extraction.record),
                outcomes: &extraction.outcomes,
                error: None,
            },
            Err(error) => DocumentJson {
                path: outcome.path.display().to_string(),
                record: None,
                outcomes: &[],
                error: Some(error.to_string()),
            },
        })
        .collect()
}

fn failures_json(failures: &[DocumentOutcome]) -> Vec<FailureJson> {
    failures
        .iter()
        .filter_map(|outcome| {
            outcome.result.as_ref().err().map(|error| FailureJson {
                path: outcome.path.display().to_string(),
                error: error.to_string(),
            })
        })
        .collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serialize output")
}

// =============================================================================
// Commands
// =============================================================================

pub fn print_extract(result: &ExtractResult, format: OutputFormatArg) -> Result<()> {
    match format {
        OutputFormatArg::Json => println!("{}", to_json(&documents_json(&result.outcomes))?),
        OutputFormatArg::Table => {
            println!("{}", extract_table(&result.outcomes, &result.fields));
            let summary = summarize(&result.outcomes);
            println!(
                "Documents: {}  Dated: {}  Failed: {}",
                summary.documents, summary.dated, summary.failed
            );
            print_failures(&result.outcomes);
        }
    }
    Ok(())
}

pub fn print_trend(result: &TrendResult, format: OutputFormatArg) -> Result<()> {
    match format {
        OutputFormatArg::Json => {
            let output = TrendJson {
                records: result.series.records(),
                latest_change: result.series.latest_change(),
                failures: failures_json(&result.failures),
            };
            println!("{}", to_json(&output)?);
        }
        OutputFormatArg::Table => {
            let change = result.series.latest_change();
            println!(
                "{}",
                trend_table(result.series.records(), &result.fields, &change)
            );
            print_failures(&result.failures);
        }
    }
    Ok(())
}

pub fn print_import(import: &CsvImport, format: OutputFormatArg) -> Result<()> {
    let records = labrec_extract::sort_for_trend(import.records.clone());
    match format {
        OutputFormatArg::Json => {
            let output = ImportJson {
                records: &records,
                skipped: import
                    .skipped
                    .iter()
                    .map(|row| SkippedJson {
                        line: row.line,
                        reason: row.reason.clone(),
                    })
                    .collect(),
            };
            println!("{}", to_json(&output)?);
        }
        OutputFormatArg::Table => {
            let fields = imported_fields(import);
            let change = labrec_extract::TrendSeries::new(records.clone()).latest_change();
            println!("{}", trend_table(&records, &fields, &change));
            if !import.skipped.is_empty() {
                eprintln!("Skipped rows:");
                for row in &import.skipped {
                    eprintln!("- line {}: {}", row.line, row.reason);
                }
            }
        }
    }
    Ok(())
}

pub fn print_fields(registry: &FieldPatternRegistry) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Candidates"),
        header_cell("Example labels"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for rule in registry.rules() {
        let examples: Vec<&str> = rule
            .candidates()
            .iter()
            .map(labrec_extract::PatternCandidate::example)
            .collect();
        table.add_row(vec![
            field_cell(rule.field()),
            Cell::new(rule.candidates().len()),
            Cell::new(examples.join(", ")),
        ]);
    }
    println!("{table}");
    println!("Other field names are matched by their own name followed by a value.");
}

fn print_failures(outcomes: &[DocumentOutcome]) {
    let failures: Vec<_> = outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().err().map(|error| (&outcome.path, error)))
        .collect();
    if failures.is_empty() {
        return;
    }
    eprintln!("Errors:");
    for (path, error) in failures {
        eprintln!("- {}: {error}", path.display());
    }
}

// =============================================================================
// Tables
// =============================================================================

fn extract_table(outcomes: &[DocumentOutcome], fields: &[String]) -> Table {
    let mut table = Table::new();
    let mut header = vec![header_cell("Document"), header_cell("Date")];
    header.extend(fields.iter().map(|field| header_cell(field)));
    header.push(header_cell("Found"));
    table.set_header(header);
    apply_table_style(&mut table);
    for index in 0..fields.len() {
        align_column(&mut table, index + 2, CellAlignment::Right);
    }

    for outcome in outcomes {
        let document = Cell::new(labrec_cli::pipeline::source_id(&outcome.path));
        let mut row = vec![document];
        match &outcome.result {
            Ok(extraction) => {
                let record = &extraction.record;
                row.push(date_cell(record));
                row.extend(fields.iter().map(|field| value_cell(record.get(field))));
                row.push(Cell::new(format!(
                    "{}/{}",
                    extraction.found_count(),
                    extraction.outcomes.len()
                )));
            }
            Err(_) => {
                row.push(dim_cell("-"));
                row.extend(fields.iter().map(|_| dim_cell("-")));
                row.push(
                    Cell::new("failed")
                        .fg(Color::Red)
                        .add_attribute(Attribute::Bold),
                );
            }
        }
        table.add_row(row);
    }
    table
}

fn trend_table(
    records: &[ExtractionRecord],
    fields: &[String],
    change: &BTreeMap<String, f64>,
) -> Table {
    let mut table = Table::new();
    let mut header = vec![header_cell("Date"), header_cell("Document")];
    header.extend(fields.iter().map(|field| header_cell(field)));
    table.set_header(header);
    apply_table_style(&mut table);
    for index in 0..fields.len() {
        align_column(&mut table, index + 2, CellAlignment::Right);
    }

    for record in records {
        let mut row = vec![date_cell(record), Cell::new(record.source_id())];
        row.extend(fields.iter().map(|field| value_cell(record.get(field))));
        table.add_row(row);
    }

    if !change.is_empty() {
        let mut row = vec![
            Cell::new("Change")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            dim_cell("latest two dated"),
        ];
        row.extend(fields.iter().map(|field| change_cell(change.get(field).copied())));
        table.add_row(row);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn field_cell(field: &str) -> Cell {
    Cell::new(field)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn date_cell(record: &ExtractionRecord) -> Cell {
    match record.observed_date() {
        Some(date) => Cell::new(date),
        None => dim_cell("undated"),
    }
}

fn value_cell(value: Option<&FieldValue>) -> Cell {
    match value {
        Some(FieldValue::Numeric(number)) => Cell::new(number),
        Some(FieldValue::Raw(text)) => Cell::new(text).fg(Color::Yellow),
        None => dim_cell("-"),
    }
}

fn change_cell(change: Option<f64>) -> Cell {
    match change {
        Some(delta) if delta > 0.0 => Cell::new(format!("{delta:+.2}")).fg(Color::Red),
        Some(delta) if delta < 0.0 => Cell::new(format!("{delta:+.2}")).fg(Color::Green),
        Some(_) => dim_cell("0.00"),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
