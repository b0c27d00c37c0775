//! Plot command implementation.

use anyhow::{Context, Result};
use quotes_data::{load_csv, TableReport};
use quotes_monitor::QuoteChart;
use tracing::info;

use crate::cli::PlotArgs;

pub async fn run(args: PlotArgs) -> Result<()> {
    let table = load_csv(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    info!("Loaded {} rows from {:?}", table.len(), args.input);

    let chart = QuoteChart::new(&table);
    if args.no_chart || !chart.is_drawable() {
        println!("{}", TableReport::new(&table).summary());
        if !chart.is_drawable() {
            eprintln!(
                "Nothing to chart: every price is missing. \
                 Regular market hours are 09:30-16:00 America/New_York, Monday to Friday."
            );
        }
        return Ok(());
    }

    chart.run().context("Failed to draw chart")
}
