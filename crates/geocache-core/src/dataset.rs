//! Source dataset loading.
//!
//! Rows are kept as plain column -> text maps; different spreadsheets name
//! their location columns differently, so lookups go through a
//! [`ColumnMapping`].

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub type Row = HashMap<String, String>;

/// Which columns hold the location fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub city: String,
    pub state_province: String,
    pub country: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            city: "City".to_string(),
            state_province: "State/Province".to_string(),
            country: "Country".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DataTable {
    rows: Vec<Row>,
    /// Records dropped at load time because they were not valid UTF-8.
    undecodable: usize,
}

impl DataTable {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            undecodable: 0,
        }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open dataset: {}", path.display()))?;
        let table = Self::from_reader(file)
            .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
        debug!(path = %path.display(), rows = table.len(), "Loaded dataset");
        Ok(table)
    }

    /// Read CSV with a header row. Short rows are allowed; their trailing
    /// columns are simply absent. Records that are not valid UTF-8 (typically
    /// a cp1252 spreadsheet export) are logged and dropped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let mut rows = Vec::new();
        let mut undecodable = 0;
        for (index, result) in rdr.byte_records().enumerate() {
            let record = result.with_context(|| format!("Malformed CSV record {}", index + 1))?;
            let fields: Result<Vec<&str>, _> = record.iter().map(std::str::from_utf8).collect();
            let fields = match fields {
                Ok(fields) => fields,
                Err(e) => {
                    let line = record.position().map(|p| p.line()).unwrap_or_default();
                    warn!(record = index + 1, line, error = %e, "Skipping CSV record that is not valid UTF-8");
                    undecodable += 1;
                    continue;
                }
            };
            let row: Row = headers
                .iter()
                .zip(fields)
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect();
            rows.push(row);
        }
        Ok(Self { rows, undecodable })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn undecodable(&self) -> usize {
        self.undecodable
    }
}

/// Non-blank, trimmed value of a column.
pub fn row_value<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
