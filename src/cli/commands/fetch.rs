//! Fetch command implementation.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use quotes_collector::Collector;
use quotes_config::{load_config_or_default, AppConfig};
use quotes_core::error::CollectorError;
use quotes_core::market_hours::is_regular_session;
use quotes_core::{ResultTable, SessionConnector};
use quotes_data::{sample_table, save_csv, TableReport};
use quotes_monitor::QuoteChart;
use quotes_session::{PaperConnector, TwsConnector};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::cli::{FetchArgs, OutputFormat};

const MARKET_HOURS_HINT: &str =
    "Regular market hours are 09:30-16:00 America/New_York, Monday to Friday.";

pub async fn run(args: FetchArgs, config_path: &Path) -> Result<()> {
    let mut config =
        load_config_or_default(config_path).context("Failed to load configuration")?;
    apply_overrides(&mut config, &args)?;
    config.validate().context("Invalid fetch options")?;

    let symbols = if args.symbols.is_empty() {
        config.collection.symbols.clone()
    } else {
        args.symbols.clone()
    };

    if !args.paper {
        check_market_hours(&config)?;
    }

    info!(
        "Fetching {:?} ({} data) from {}",
        symbols,
        config.collection.data_class,
        if args.paper {
            "paper terminal".to_string()
        } else {
            config.tws_config().endpoint()
        }
    );

    let collected = if args.paper {
        collect(PaperConnector::demo(), &config, &symbols).await
    } else {
        collect(TwsConnector::new(config.tws_config()), &config, &symbols).await
    };

    let fallback = config.output.fallback_to_sample && !args.no_fallback;
    let table = match collected {
        Ok(table) if !table.all_prices_missing() => table,
        Ok(table) => {
            warn!("No prices received for {:?}", symbols);
            print_troubleshooting();
            if fallback {
                sample_with_notice("No prices received; showing sample data")
            } else {
                table
            }
        }
        Err(e) => {
            error!("Collection failed: {}", e);
            print_troubleshooting();
            if !fallback {
                return Err(e).context("Failed to collect quotes");
            }
            sample_with_notice(&format!("Collection failed ({}); showing sample data", e))
        }
    };

    match args.output {
        OutputFormat::Json => println!("{}", TableReport::new(&table).to_json()?),
        OutputFormat::Text => println!("{}", TableReport::new(&table).summary()),
    }

    let save_path = args
        .save
        .clone()
        .or_else(|| config.output.csv_path.as_ref().map(PathBuf::from));
    if let Some(path) = save_path {
        save_csv(&table, &path)
            .with_context(|| format!("Failed to save results to {}", path.display()))?;
        info!("Results saved to {:?}", path);
    }

    if args.chart || config.output.chart {
        let chart = QuoteChart::new(&table);
        if chart.is_drawable() {
            chart.run().context("Failed to draw chart")?;
        } else {
            eprintln!("Nothing to chart: every price is missing. {}", MARKET_HOURS_HINT);
        }
    }

    Ok(())
}

async fn collect<C: SessionConnector>(
    connector: C,
    config: &AppConfig,
    symbols: &[String],
) -> Result<ResultTable, CollectorError> {
    Collector::new(connector, config.resolver(), config.collector_config())
        .collect(symbols)
        .await
}

fn apply_overrides(config: &mut AppConfig, args: &FetchArgs) -> Result<()> {
    if let Some(host) = &args.host {
        config.terminal.host = host.clone();
    }
    if let Some(port) = args.port {
        config.terminal.port = port;
    }
    if !args.client_ids.is_empty() {
        config.terminal.client_ids = args.client_ids.clone();
    }
    if let Some(class) = args.data_class {
        config.collection.data_class = class;
    }
    if let Some(secs) = args.timeout {
        config.collection.overall_timeout_ms = timeout_millis(secs)?;
    }
    Ok(())
}

fn timeout_millis(secs: f64) -> Result<u64> {
    let timeout = Duration::try_from_secs_f64(secs)
        .with_context(|| format!("Invalid timeout: {} seconds", secs))?;
    let millis = u64::try_from(timeout.as_millis())
        .with_context(|| format!("Timeout of {} seconds is too large", secs))?;
    if millis == 0 {
        bail!("Timeout must be at least 1 millisecond");
    }
    Ok(millis)
}

fn check_market_hours(config: &AppConfig) -> Result<()> {
    if is_regular_session(Utc::now()) {
        return Ok(());
    }
    if config.collection.require_market_hours {
        bail!("Market is closed. {}", MARKET_HOURS_HINT);
    }
    warn!("Market is closed; delayed prices may be missing. {}", MARKET_HOURS_HINT);
    Ok(())
}

fn sample_with_notice(notice: &str) -> ResultTable {
    let mut table = sample_table();
    table.notices.push(notice.to_string());
    table
}

fn print_troubleshooting() {
    eprintln!();
    eprintln!("=== Troubleshooting ===");
    eprintln!("1. Is the terminal running with API connections enabled?");
    eprintln!("2. Does the port match the terminal (7497 paper, 7496 live)?");
    eprintln!("3. Do you have market data permissions for these symbols?");
    eprintln!("4. {}", MARKET_HOURS_HINT);
    eprintln!("5. Is another client already using every candidate client id?");
}
