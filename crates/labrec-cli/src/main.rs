//! `labrec`: lab report field extractor CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use labrec_cli::logging::{LogConfig, LogFormat, init_logging};
use labrec_cli::pipeline::summarize;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{Setup, run_extract, run_import_csv, run_trend};
use crate::summary::{print_extract, print_fields, print_import, print_trend};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Run the selected command and return the process exit code.
fn run(cli: &Cli) -> anyhow::Result<i32> {
    let setup = Setup::load(cli.config.as_deref())?;
    match &cli.command {
        Command::Extract(args) => {
            let result = run_extract(args, &setup)?;
            print_extract(&result, args.format)?;
            Ok(i32::from(summarize(&result.outcomes).has_failures()))
        }
        Command::Trend(args) => {
            let result = run_trend(args, &setup)?;
            print_trend(&result, args.format)?;
            Ok(i32::from(!result.failures.is_empty()))
        }
        Command::Fields => {
            print_fields(&setup.registry);
            Ok(0)
        }
        Command::ImportCsv(args) => {
            let import = run_import_csv(args)?;
            print_import(&import, args.format)?;
            Ok(0)
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
