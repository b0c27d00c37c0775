//! Collection results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One symbol's outcome of a collection run.
///
/// `None` marks a value that was never observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Price")]
    pub price: Option<f64>,
    #[serde(rename = "Short Fee (%)")]
    pub short_fee: Option<f64>,
    #[serde(rename = "Timestamp")]
    pub observed_at: DateTime<Utc>,
}

impl ResultRow {
    /// Row with nothing observed.
    pub fn missing(symbol: &str, observed_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: None,
            short_fee: None,
            observed_at,
        }
    }

    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.short_fee.is_none()
    }
}

/// Ordered rows, one per requested symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub collected_at: DateTime<Utc>,
    rows: Vec<ResultRow>,
    /// Non-informational terminal notices seen during the run
    #[serde(default)]
    pub notices: Vec<String>,
}

impl ResultTable {
    pub fn new(collected_at: DateTime<Utc>, rows: Vec<ResultRow>) -> Self {
        Self {
            collected_at,
            rows,
            notices: Vec::new(),
        }
    }

    pub fn with_notices(mut self, notices: Vec<String>) -> Self {
        self.notices = notices;
        self
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row by symbol.
    pub fn get(&self, symbol: &str) -> Option<&ResultRow> {
        self.rows.iter().find(|r| r.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.symbol.as_str()).collect()
    }

    /// Number of rows with a price.
    pub fn priced_count(&self) -> usize {
        self.rows.iter().filter(|r| r.has_price()).count()
    }

    /// True when no row received a price.
    pub fn all_prices_missing(&self) -> bool {
        self.priced_count() == 0
    }
}

impl IntoIterator for ResultTable {
    type Item = ResultRow;
    type IntoIter = std::vec::IntoIter<ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
