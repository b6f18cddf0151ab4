// 📄 Transaction Table - Raw statement export as read from disk
//
// Cells are kept as the original text so every source column can be written
// back verbatim. Typed access goes through `CellValue`.

use crate::error::{AllocatorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

// ============================================================================
// CELL VALUE
// ============================================================================

/// Typed view of a single cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Classify a raw cell: blank → Empty, plain decimal → Number, anything else → Text
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }
}

// ============================================================================
// TRANSACTION TABLE
// ============================================================================

/// Ordered rows keyed by unique, order-preserving column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TransactionTable {
    /// Build a table from headers and raw rows
    ///
    /// Headers must be unique and every row must have one cell per header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(AllocatorError::InvalidTable(format!(
                    "duplicate column '{}'",
                    header
                )));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(AllocatorError::InvalidTable(format!(
                    "row {} has {} cells, expected {}",
                    i + 1,
                    row.len(),
                    headers.len()
                )));
            }
        }

        Ok(TransactionTable { headers, rows })
    }

    /// Parse CSV text (first record = header)
    ///
    /// `source_name` only labels parse errors.
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| AllocatorError::Parse {
                path: source_name.to_string(),
                message: format!("could not read header row: {}", e),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(AllocatorError::Parse {
                path: source_name.to_string(),
                message: "file has no header row".to_string(),
            });
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| AllocatorError::Parse {
                path: source_name.to_string(),
                message: format!("{} (columns found: {})", e, headers.join(", ")),
            })?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        TransactionTable::new(headers, rows).map_err(|e| AllocatorError::Parse {
            path: source_name.to_string(),
            message: e.to_string(),
        })
    }

    /// Load a statement CSV from disk
    pub fn load_csv(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let table = TransactionTable::from_reader(file, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            rows = table.len(),
            columns = table.column_count(),
            "loaded statement"
        );
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Raw text of a cell ("" when out of range)
    pub fn raw(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn value(&self, row: usize, column: usize) -> CellValue {
        CellValue::from_raw(self.raw(row, column))
    }

    /// True when every non-empty cell in the column is a plain number
    /// and at least one cell holds a value
    ///
    /// An all-blank column is not numeric: it carries no amounts, so it is
    /// never picked as an amount column.
    pub fn is_numeric_column(&self, column: usize) -> bool {
        if column >= self.headers.len() {
            return false;
        }

        let mut saw_number = false;
        for row in 0..self.rows.len() {
            match self.value(row, column) {
                CellValue::Empty => {}
                CellValue::Number(_) => saw_number = true,
                CellValue::Text(_) => return false,
            }
        }
        saw_number
    }
}

// ============================================================================
// TESTS
// ============================================================================
