//! CLI argument definitions for the ICU feature builder.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use icu_cli::config::parse_signal_arg;

#[derive(Parser)]
#[command(
    name = "icu-features",
    version,
    about = "Build the stay-level ICU feature table",
    long_about = "Build one feature row per ICU stay from raw clinical tables.\n\n\
                  Joins demographics, windowed vital-sign statistics and outcome\n\
                  labels, then writes the table as Parquet and CSV."
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

    /// Allow raw cell values in logs (they are redacted by default).
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the feature table from the raw input directory.
    Build(BuildArgs),

    /// Print the effective signal dictionary.
    Signals(SignalsArgs),
}

#[derive(Parser)]
pub struct BuildArgs {
    /// TOML configuration file.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the raw CSV tables (default: data/raw).
    #[arg(long = "input-dir", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Parquet output path; the CSV copy is written alongside
    /// (default: data/processed/icu_features.parquet).
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Observation window length in hours, anchored at admission (default: 24).
    #[arg(long = "window-hours", value_name = "HOURS")]
    pub window_hours: Option<f64>,

    /// Signal to aggregate, as CODE=NAME. Repeat for several signals; any
    /// use replaces the configured dictionary.
    #[arg(long = "signal", value_name = "CODE=NAME", value_parser = parse_signal_arg)]
    pub signals: Vec<(i64, String)>,

    /// Run every stage and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct SignalsArgs {
    /// TOML configuration file.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
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
