//! Delayed quote collector CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use quotes_monitor::setup_logging;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A bad config is reported by the command itself
    let logging = quotes_config::load_config_or_default(&cli.config)
        .map(|c| c.logging)
        .unwrap_or_default();

    let log_level = cli::effective_log_level(cli.log_level.as_ref(), &logging.level);
    let json = cli.json_logs || logging.format == "json";
    let _guard = setup_logging(log_level, json, logging.file.as_deref().map(Path::new))
        .context("Failed to open log file")?;

    match cli.command {
        Commands::Fetch(args) => cli::commands::fetch::run(args, &cli.config).await,
        Commands::Plot(args) => cli::commands::plot::run(args).await,
        Commands::Resolve(args) => cli::commands::resolve::run(args, &cli.config).await,
        Commands::ValidateConfig(args) => cli::commands::validate::run(args, &cli.config).await,
    }
}
