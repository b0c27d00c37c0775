//! Text and JSON reports of a result table.

use quotes_core::types::ResultTable;

/// Report over a collected (or sample) table.
pub struct TableReport<'a> {
    table: &'a ResultTable,
    title: String,
}

impl<'a> TableReport<'a> {
    pub fn new(table: &'a ResultTable) -> Self {
        Self {
            table,
            title: "DELAYED MARKET DATA".to_string(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str(&format!("{:^59}\n", self.title));
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str(&format!(
            "  Collected:  {}\n",
            self.table.collected_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        s.push_str(&format!(
            "  Priced:     {}/{}\n\n",
            self.table.priced_count(),
            self.table.len()
        ));

        s.push_str("  Symbol        Price    Short Fee (%)   Timestamp\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        for row in self.table.iter() {
            s.push_str(&format!(
                "  {:<8} {:>10} {:>16}   {}\n",
                row.symbol,
                format_value(row.price),
                format_value(row.short_fee),
                row.observed_at.format("%Y-%m-%d %H:%M:%S")
            ));
        }

        if !self.table.notices.is_empty() {
            s.push('\n');
            s.push_str("TERMINAL MESSAGES\n");
            s.push_str("───────────────────────────────────────────────────────────\n");
            for notice in &self.table.notices {
                s.push_str(&format!("  {}\n", notice));
            }
        }

        s.push_str("\n═══════════════════════════════════════════════════════════\n");
        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self.table)
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "NaN".to_string(),
    }
}
