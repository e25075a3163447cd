//! Columnar per-instrument daily time-series table.
//!
//! Every table belongs to one instrument and holds one row per trading day
//! (or per trading day and sub-series when grouping keys such as expiry or
//! strike are present). Columns are addressed by upper-cased, trimmed names.

use std::ops::Range;

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the mandatory date column.
pub const DATE_COLUMN: &str = "DATE";

/// Normalize a column name: surrounding whitespace stripped, upper case.
#[inline]
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// A single table cell as handed over by the extraction side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Numeric view of the cell. Text is parsed; anything unparseable or
    /// non-finite is absent.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            Cell::Number(_) => None,
            Cell::Text(s) => parse_number(s),
            Cell::Empty => None,
        }
    }

    /// True when the cell carries a value that could not be read as a number.
    pub fn is_coercion_failure(&self) -> bool {
        match self {
            Cell::Number(v) => !v.is_finite(),
            Cell::Text(s) => !s.trim().is_empty() && parse_number(s).is_none(),
            Cell::Empty => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Ordering key used when sorting by grouping columns.
    pub fn key_part(&self) -> KeyPart {
        match self {
            Cell::Number(v) => KeyPart::Number(OrderedFloat(*v)),
            Cell::Text(s) => KeyPart::Text(s.trim().to_string()),
            Cell::Empty => KeyPart::Empty,
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Cell::Number(v)
        } else {
            Cell::Empty
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map(Cell::from).unwrap_or(Cell::Empty)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

/// Parse exchange-formatted numbers ("1,234.50", " 12 ", "-").
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One part of a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyPart {
    Number(OrderedFloat<f64>),
    Text(String),
    Empty,
}

/// Ordered tuple of grouping-column values for one row.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey(pub Vec<KeyPart>);

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// Numeric projection of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    /// Values with unreadable cells mapped to `None`.
    pub values: Vec<Option<f64>>,
    /// Number of non-empty cells that could not be read as numbers.
    pub coerced: usize,
}

/// Daily records for one instrument, stored column-wise.
///
/// Deserialization goes through [`TimeSeriesTable::validate`], so a table
/// read from JSON always has one cell per date in every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct TimeSeriesTable {
    instrument: String,
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

/// Wire form of [`TimeSeriesTable`] before validation.
#[derive(Deserialize)]
struct RawTable {
    instrument: String,
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl TryFrom<RawTable> for TimeSeriesTable {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        let table = Self {
            instrument: raw.instrument,
            dates: raw.dates,
            columns: raw
                .columns
                .into_iter()
                .map(|c| Column {
                    name: normalize_column_name(&c.name),
                    cells: c.cells,
                })
                .collect(),
        };
        table.validate()?;
        Ok(table)
    }
}

impl TimeSeriesTable {
    /// Create an empty table.
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            dates: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Create a table with the given dates and no metric columns.
    pub fn with_dates(instrument: impl Into<String>, dates: Vec<NaiveDate>) -> Self {
        Self {
            instrument: instrument.into(),
            dates,
            columns: Vec::new(),
        }
    }

    /// Build a table from row-oriented data.
    pub fn from_rows(
        instrument: impl Into<String>,
        column_names: &[&str],
        rows: Vec<(NaiveDate, Vec<Cell>)>,
    ) -> Result<Self> {
        let mut columns: Vec<Column> = column_names
            .iter()
            .map(|name| Column {
                name: normalize_column_name(name),
                cells: Vec::with_capacity(rows.len()),
            })
            .collect();
        let mut dates = Vec::with_capacity(rows.len());

        for (date, cells) in rows {
            if cells.len() != columns.len() {
                return Err(Error::data(format!(
                    "row for {} has {} cells, expected {}",
                    date,
                    cells.len(),
                    columns.len()
                )));
            }
            dates.push(date);
            for (column, cell) in columns.iter_mut().zip(cells) {
                column.cells.push(cell);
            }
        }

        let table = Self {
            instrument: instrument.into(),
            dates,
            columns,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = normalize_column_name(name);
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    /// Look up a column, failing with `MissingColumn` if absent.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| Error::missing_column(normalize_column_name(name)))
    }

    /// Cell at `row` in the named column.
    pub fn cell(&self, name: &str, row: usize) -> Option<&Cell> {
        self.column(name).and_then(|c| c.cells.get(row))
    }

    /// Numeric view of a column with coercion accounting.
    pub fn numeric(&self, name: &str) -> Result<NumericColumn> {
        let column = self.require_column(name)?;
        let mut coerced = 0;
        let values = column
            .cells
            .iter()
            .map(|cell| {
                if cell.is_coercion_failure() {
                    coerced += 1;
                }
                cell.as_f64()
            })
            .collect();
        Ok(NumericColumn { values, coerced })
    }

    /// Insert or replace a column.
    pub fn set_column(&mut self, name: &str, cells: Vec<Cell>) -> Result<()> {
        if cells.len() != self.dates.len() {
            return Err(Error::data(format!(
                "column {} has {} cells, table has {} rows",
                normalize_column_name(name),
                cells.len(),
                self.dates.len()
            )));
        }
        match self.position(name) {
            Some(i) => self.columns[i].cells = cells,
            None => self.columns.push(Column {
                name: normalize_column_name(name),
                cells,
            }),
        }
        Ok(())
    }

    /// Insert or replace a numeric column.
    pub fn set_numeric(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        self.set_column(name, values.into_iter().map(Cell::from).collect())
    }

    /// Builder-style variant of [`set_column`](Self::set_column).
    pub fn with_column(mut self, name: &str, cells: Vec<Cell>) -> Result<Self> {
        self.set_column(name, cells)?;
        Ok(self)
    }

    /// Check that every column matches the row count and names are unique.
    pub fn validate(&self) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            if column.cells.len() != self.dates.len() {
                return Err(Error::data(format!(
                    "{}: column {} has {} cells, table has {} rows",
                    self.instrument,
                    column.name,
                    column.cells.len(),
                    self.dates.len()
                )));
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::data(format!(
                    "{}: duplicate column {}",
                    self.instrument, column.name
                )));
            }
        }
        Ok(())
    }

    /// Whether dates are unique across the whole table.
    pub fn has_unique_dates(&self) -> bool {
        let mut sorted = self.dates.clone();
        sorted.sort_unstable();
        sorted.windows(2).all(|w| w[0] != w[1])
    }

    pub fn is_sorted_by_date(&self) -> bool {
        self.dates.windows(2).all(|w| w[0] <= w[1])
    }

    /// Grouping key of a row.
    pub fn group_key(&self, row: usize, keys: &[&Column]) -> GroupKey {
        GroupKey(keys.iter().map(|c| c.cells[row].key_part()).collect())
    }

    /// Reorder rows. `order` must be a permutation of `0..len`.
    pub fn take(&self, order: &[usize]) -> Self {
        Self {
            instrument: self.instrument.clone(),
            dates: order.iter().map(|&i| self.dates[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    cells: order.iter().map(|&i| c.cells[i].clone()).collect(),
                })
                .collect(),
        }
    }

    /// Copy of the table sorted ascending by date (stable).
    pub fn sorted_by_date(&self) -> Self {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&i| self.dates[i]);
        self.take(&order)
    }

    /// Sort by `(group keys…, date)` and return the contiguous row range of
    /// each group. With no keys the whole table is one group.
    ///
    /// Fails if a date occurs twice within one group.
    pub fn grouped(&self, keys: &[String]) -> Result<(Self, Vec<Range<usize>>)> {
        let (sorted, ranges) = self.group_rows(keys)?;
        for range in &ranges {
            if let Some(pair) = sorted.dates[range.clone()].windows(2).find(|w| w[0] == w[1]) {
                return Err(Error::data(format!(
                    "{}: more than one record for {}",
                    self.instrument, pair[0]
                )));
            }
        }
        Ok((sorted, ranges))
    }

    /// Check that every `(group keys…, date)` pair occurs once.
    pub fn check_unique_records(&self, keys: &[String]) -> Result<()> {
        self.grouped(keys).map(|_| ())
    }

    fn group_rows(&self, keys: &[String]) -> Result<(Self, Vec<Range<usize>>)> {
        if keys.is_empty() {
            let sorted = self.sorted_by_date();
            let ranges = if sorted.is_empty() {
                Vec::new()
            } else {
                vec![0..sorted.len()]
            };
            return Ok((sorted, ranges));
        }

        let key_columns = keys
            .iter()
            .map(|k| self.require_column(k))
            .collect::<Result<Vec<_>>>()?;

        let row_keys: Vec<GroupKey> = (0..self.len())
            .map(|row| self.group_key(row, &key_columns))
            .collect();
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            row_keys[a]
                .cmp(&row_keys[b])
                .then_with(|| self.dates[a].cmp(&self.dates[b]))
        });

        let mut ranges = Vec::new();
        let mut start = 0;
        for pos in 1..=order.len() {
            if pos == order.len() || row_keys[order[pos]] != row_keys[order[start]] {
                ranges.push(start..pos);
                start = pos;
            }
        }

        Ok((self.take(&order), ranges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("  deliv_per "), "DELIV_PER");
    }

    #[test]
    fn test_cell_coercion() {
        assert_eq!(Cell::Number(1.5).as_f64(), Some(1.5));
        assert_eq!(Cell::from("1,234.5").as_f64(), Some(1234.5));
        assert_eq!(Cell::from("-").as_f64(), None);
        assert!(Cell::from("-").is_coercion_failure());
        assert!(!Cell::from("  ").is_coercion_failure());
        assert!(!Cell::Empty.is_coercion_failure());
        assert_eq!(Cell::from(f64::NAN), Cell::Empty);
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = TimeSeriesTable::with_dates("INFY", vec![d(1), d(2)])
            .with_column(" Close ", vec![Cell::Number(1.0), Cell::Number(2.0)])
            .unwrap();
        assert!(table.has_column("close"));
        assert_eq!(table.column_names(), vec!["CLOSE"]);
        assert!(matches!(
            table.require_column("OPEN"),
            Err(Error::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut table = TimeSeriesTable::with_dates("INFY", vec![d(1), d(2)]);
        assert!(table.set_column("X", vec![Cell::Empty]).is_err());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn test_numeric_counts_coercions() {
        let table = TimeSeriesTable::with_dates("INFY", vec![d(1), d(2), d(3)])
            .with_column(
                "QTY",
                vec![Cell::Number(1.0), Cell::from("n/a"), Cell::Empty],
            )
            .unwrap();
        let numeric = table.numeric("qty").unwrap();
        assert_eq!(numeric.values, vec![Some(1.0), None, None]);
        assert_eq!(numeric.coerced, 1);
    }

    #[test]
    fn test_sorted_by_date() {
        let table = TimeSeriesTable::with_dates("INFY", vec![d(3), d(1), d(2)])
            .with_column("X", vec![Cell::Number(3.0), Cell::Number(1.0), Cell::Number(2.0)])
            .unwrap();
        let sorted = table.sorted_by_date();
        assert_eq!(sorted.dates(), &[d(1), d(2), d(3)]);
        assert_eq!(sorted.numeric("X").unwrap().values, vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert!(sorted.is_sorted_by_date());
        assert!(sorted.has_unique_dates());
    }

    #[test]
    fn test_grouped_ranges() {
        let table = TimeSeriesTable::with_dates("NIFTY", vec![d(2), d(1), d(2), d(1)])
            .with_column(
                "EXPIRY",
                vec!["MAR".into(), "FEB".into(), "FEB".into(), "MAR".into()],
            )
            .unwrap();
        let (sorted, ranges) = table.grouped(&["expiry".to_string()]).unwrap();
        assert_eq!(ranges, vec![0..2, 2..4]);
        assert_eq!(sorted.dates(), &[d(1), d(2), d(1), d(2)]);
        assert_eq!(sorted.cell("EXPIRY", 0), Some(&Cell::from("FEB")));
        assert!(!sorted.has_unique_dates());
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let table = TimeSeriesTable::from_rows(
            "TCS",
            &["close"],
            vec![
                (d(1), vec![Cell::Number(1.0)]),
                (d(1), vec![Cell::Number(5.0)]),
            ],
        )
        .unwrap();
        assert!(matches!(table.grouped(&[]), Err(Error::Data(_))));
        assert!(table.check_unique_records(&[]).is_err());

        // The same date in two groups is fine.
        let table = TimeSeriesTable::with_dates("NIFTY", vec![d(1), d(1)])
            .with_column("EXPIRY", vec!["FEB".into(), "MAR".into()])
            .unwrap();
        assert!(table.check_unique_records(&[]).is_err());
        assert!(table.check_unique_records(&["EXPIRY".to_string()]).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let ragged = serde_json::from_str::<TimeSeriesTable>(
            r#"{"instrument": "ITC", "dates": ["2024-02-01", "2024-02-02"],
                "columns": [{"name": "v", "cells": [1.0]}]}"#,
        );
        assert!(ragged.is_err());

        let table: TimeSeriesTable = serde_json::from_str(
            r#"{"instrument": "ITC", "dates": ["2024-02-01"],
                "columns": [{"name": " v ", "cells": [1.0]}]}"#,
        )
        .unwrap();
        assert_eq!(table.numeric("V").unwrap().values, vec![Some(1.0)]);
    }

    #[test]
    fn test_grouped_missing_key() {
        let table = TimeSeriesTable::with_dates("NIFTY", vec![d(1)]);
        assert!(matches!(
            table.grouped(&["STRIKE".to_string()]),
            Err(Error::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_from_rows() {
        let table = TimeSeriesTable::from_rows(
            "TCS",
            &["close", "volume"],
            vec![
                (d(1), vec![Cell::Number(100.0), Cell::Number(10.0)]),
                (d(2), vec![Cell::Number(101.0), Cell::Empty]),
            ],
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names(), vec!["CLOSE", "VOLUME"]);

        let bad = TimeSeriesTable::from_rows("TCS", &["close"], vec![(d(1), vec![])]);
        assert!(bad.is_err());
    }
}
