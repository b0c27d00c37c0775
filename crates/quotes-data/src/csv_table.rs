//! CSV persistence of result tables.

use csv::{ReaderBuilder, WriterBuilder};
use quotes_core::error::DataError;
use quotes_core::types::{ResultRow, ResultTable};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A result table stored as `Symbol,Price,Short Fee (%),Timestamp`.
///
/// Missing values are written as empty fields.
pub struct CsvTable {
    path: PathBuf,
}

impl CsvTable {
    /// Target a path for writing.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Open an existing file for reading.
    pub fn open(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            return Err(DataError::NotFound(path.display().to_string()));
        }
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, table: &ResultTable) -> Result<(), DataError> {
        let mut writer = WriterBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| DataError::WriteError(e.to_string()))?;

        for row in table.iter() {
            writer
                .serialize(row)
                .map_err(|e| DataError::WriteError(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| DataError::WriteError(e.to_string()))?;

        debug!("Wrote {} rows to {}", table.len(), self.path.display());
        Ok(())
    }

    pub fn read(&self) -> Result<ResultTable, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut rows = Vec::new();
        for result in reader.deserialize() {
            let row: ResultRow = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            rows.push(row);
        }

        // Rows of one run share a collection time; the latest stands in for it.
        let collected_at = rows
            .iter()
            .map(|r| r.observed_at)
            .max()
            .ok_or(DataError::EmptyTable)?;

        Ok(ResultTable::new(collected_at, rows))
    }
}
