//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use quotes_core::MarketDataClass;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quotes")]
#[command(author, version, about = "Delayed quote and short-fee collector")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level (defaults to `[logging].level` from the config)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// The command-line level wins over the configured one.
pub fn effective_log_level<'a>(cli: Option<&LogLevel>, configured: &'a str) -> &'a str {
    match cli {
        Some(level) => level.as_str(),
        None => configured,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect delayed prices and short fees from the terminal
    Fetch(FetchArgs),
    /// Chart a previously saved table
    Plot(PlotArgs),
    /// Show the routing used for symbols
    Resolve(ResolveArgs),
    /// Validate configuration
    ValidateConfig(ValidateArgs),
}

#[derive(clap::Args)]
pub struct FetchArgs {
    /// Symbols to collect (comma-separated)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Overall wait for data, in seconds
    #[arg(short, long)]
    pub timeout: Option<f64>,

    /// Terminal host
    #[arg(long)]
    pub host: Option<String>,

    /// Terminal port (7497 paper, 7496 live)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Candidate client ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub client_ids: Vec<i32>,

    /// Market data class (live, frozen, delayed, delayed-frozen)
    #[arg(long)]
    pub data_class: Option<MarketDataClass>,

    /// Save results to a CSV file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Show a bar chart of the results
    #[arg(long)]
    pub chart: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Fail instead of showing sample data when nothing is collected
    #[arg(long)]
    pub no_fallback: bool,

    /// Use the in-process paper terminal instead of a real one
    #[arg(long)]
    pub paper: bool,
}

#[derive(clap::Args)]
pub struct PlotArgs {
    /// CSV file written by `fetch --save`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Print the table instead of charting it
    #[arg(long)]
    pub no_chart: bool,
}

#[derive(clap::Args)]
pub struct ResolveArgs {
    /// Symbols to resolve
    #[arg(required = true, value_delimiter = ',')]
    pub symbols: Vec<String>,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Print the built-in default configuration as TOML
    #[arg(long)]
    pub print_default: bool,
}
