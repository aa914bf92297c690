//! Raw record ingestion.
//!
//! A [`RawTable`] is an ordered collection of loosely typed rows exactly as
//! scraped: cells may be numbers, free text or missing. Every row carries a
//! stable `product_id` assigned at ingestion.
//!
//! # Example
//!
//! ```rust
//! use phone_features::dataset::{RawRecord, RawTable};
//!
//! let table = RawTable::from_records(vec![
//!     RawRecord::new()
//!         .with("ScreenSize", 6.1)
//!         .with("Resolution", "1170x2532"),
//! ]);
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.product_id(0), "001");
//! ```

use crate::error::Result;
use crate::schema::PRODUCT_ID_COLUMN;
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Cell texts read as missing.
const NA_VALUES: [&str; 10] = [
    "", "NA", "N/A", "n/a", "#N/A", "NaN", "nan", "null", "NULL", "None",
];

/// A single raw cell.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Missing,
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Parse a CSV cell: NA markers become [`RawValue::Missing`], anything
    /// else is kept as text for the numeric coercion stage.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if NA_VALUES.contains(&trimmed) {
            RawValue::Missing
        } else {
            RawValue::Text(trimmed.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }

    /// Render the cell for identifiers and CSV output.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Missing => None,
            RawValue::Number(v) => Some(v.to_string()),
            RawValue::Text(s) => Some(s.clone()),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Missing, Into::into)
    }
}

static MISSING: RawValue = RawValue::Missing;

/// One phone listing as scraped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRecord {
    cells: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style cell setter.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<RawValue>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Cell value; absent columns read as missing.
    pub fn get(&self, column: &str) -> &RawValue {
        self.cells.get(column).unwrap_or(&MISSING)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<RawValue> {
        self.cells.remove(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    fn missing_count(&self, columns: &[String]) -> usize {
        columns
            .iter()
            .filter(|c| c.as_str() != PRODUCT_ID_COLUMN)
            .filter(|c| self.get(c).is_missing())
            .count()
    }
}

/// An ordered table of raw records with a known column list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<RawRecord>,
}

impl RawTable {
    /// Build a table from records; columns are the union of the record keys
    /// in first-seen order. Rows without a `product_id` get one.
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for column in record.columns() {
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }
        let mut table = Self {
            columns,
            rows: records,
        };
        table.assign_product_ids();
        table
    }

    /// Load a headed CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let mut row = RawRecord::new();
            for (i, column) in columns.iter().enumerate() {
                let value = record.get(i).map_or(RawValue::Missing, RawValue::from_cell);
                row.insert(column.clone(), value);
            }
            rows.push(row);
        }
        debug!(rows = rows.len(), columns = columns.len(), "loaded raw table");

        let mut table = Self { columns, rows };
        table.assign_product_ids();
        Ok(table)
    }

    /// Zero-padded 1-based row index for rows that carry no identifier.
    fn assign_product_ids(&mut self) {
        let mut assigned = false;
        for (i, row) in self.rows.iter_mut().enumerate() {
            if row.get(PRODUCT_ID_COLUMN).is_missing() {
                row.insert(PRODUCT_ID_COLUMN, format!("{:03}", i + 1));
                assigned = true;
            }
        }
        if assigned && !self.has_column(PRODUCT_ID_COLUMN) {
            self.columns.push(PRODUCT_ID_COLUMN.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn product_id(&self, row: usize) -> String {
        self.rows[row]
            .get(PRODUCT_ID_COLUMN)
            .as_text()
            .unwrap_or_else(|| format!("{:03}", row + 1))
    }

    /// Values of one column, missing where a row lacks it.
    pub fn column(&self, column: &str) -> Vec<RawValue> {
        self.rows.iter().map(|r| r.get(column).clone()).collect()
    }

    /// Remove a column and return its values.
    pub fn remove_column(&mut self, column: &str) -> Option<Vec<RawValue>> {
        let pos = self.columns.iter().position(|c| c == column)?;
        self.columns.remove(pos);
        Some(
            self.rows
                .iter_mut()
                .map(|r| r.remove(column).unwrap_or(RawValue::Missing))
                .collect(),
        )
    }

    /// Keep only the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Drop rows with `max_missing` or more missing cells. Returns the kept
    /// row indices into the original table.
    pub fn drop_sparse_rows(&mut self, max_missing: usize) -> Vec<usize> {
        let columns = self.columns.clone();
        let total = self.rows.len();
        let mut kept = Vec::with_capacity(self.rows.len());
        let mut rows = Vec::with_capacity(self.rows.len());
        for (i, row) in std::mem::take(&mut self.rows).into_iter().enumerate() {
            if row.missing_count(&columns) < max_missing {
                kept.push(i);
                rows.push(row);
            }
        }
        debug!(
            dropped = total - kept.len(),
            kept = kept.len(),
            max_missing,
            "dropped sparse rows"
        );
        self.rows = rows;
        kept
    }
}
