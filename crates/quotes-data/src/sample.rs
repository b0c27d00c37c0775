//! Built-in sample table shown when no live data is available.

use chrono::Utc;
use quotes_core::types::{ResultRow, ResultTable};

/// Representative prices and short fees for the usual ETF trio.
pub fn sample_table() -> ResultTable {
    let now = Utc::now();
    let rows = [("SPY", 445.21, 0.30), ("GLD", 180.55, 0.45), ("IAU", 35.12, 0.50)]
        .into_iter()
        .map(|(symbol, price, fee)| ResultRow {
            symbol: symbol.to_string(),
            price: Some(price),
            short_fee: Some(fee),
            observed_at: now,
        })
        .collect();
    ResultTable::new(now, rows)
}
