//! Result table persistence and reports.

mod csv_table;
mod report;
mod sample;

pub use csv_table::CsvTable;
pub use report::TableReport;
pub use sample::sample_table;

use quotes_core::error::DataError;
use quotes_core::types::ResultTable;
use std::path::Path;

/// Write a table to a CSV file.
pub fn save_csv(table: &ResultTable, path: &Path) -> Result<(), DataError> {
    CsvTable::new(path).write(table)
}

/// Read a table from a CSV file.
pub fn load_csv(path: &Path) -> Result<ResultTable, DataError> {
    CsvTable::open(path)?.read()
}
