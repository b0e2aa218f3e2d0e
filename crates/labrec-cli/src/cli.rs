//! CLI argument definitions for `labrec`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "labrec",
    version,
    about = "Extract lab values and report dates from lab report documents",
    long_about = "Extract clinical lab values and report dates from PDF and text lab reports.\n\n\
                  Each requested field is recognized by an ordered list of label patterns,\n\
                  so reports from different lab vendors yield the same field names."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow extracted lab values to appear in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Extractor configuration with default fields and extra field rules.
    #[arg(long = "config", value_name = "TOML", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract fields and dates from each document.
    Extract(DocumentArgs),

    /// Extract, then order records by date and show the latest change.
    Trend(DocumentArgs),

    /// List fields with curated label patterns.
    Fields,

    /// Import dated values from a CSV file.
    ImportCsv(ImportCsvArgs),
}

#[derive(Parser)]
pub struct DocumentArgs {
    /// Report files (.pdf, .txt) or directories containing them.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Fields to extract (default: configured fields, else the standard panel).
    #[arg(long = "fields", value_name = "FIELD", value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Parser)]
pub struct ImportCsvArgs {
    /// CSV file with a leading date column.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
