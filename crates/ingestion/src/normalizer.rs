//! Raw record normalization.
//!
//! Turns already-split text records (as read from a daily exchange file)
//! into a [`TimeSeriesTable`]: headers are trimmed and upper-cased, the
//! `DATE` column is parsed, numeric-looking cells become numbers and blank
//! cells become empty.

use chrono::NaiveDate;
use footprint_core::{normalize_column_name, Cell, Error, Result, TimeSeriesTable, DATE_COLUMN};
use tracing::{debug, warn};

/// Date formats seen in exchange bhavcopy and delivery files.
const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%d-%m-%Y", "%d/%m/%Y", "%d%b%Y"];

/// Statistics about a normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    /// Records offered.
    pub rows_in: usize,
    /// Records kept in the table.
    pub rows_kept: usize,
    /// Records dropped because the date could not be parsed.
    pub bad_dates: usize,
    /// Records dropped because the cell count did not match the header.
    pub ragged_rows: usize,
}

impl NormalizationStats {
    pub fn rows_dropped(&self) -> usize {
        self.bad_dates + self.ragged_rows
    }
}

/// Normalizes raw text records into a table.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    date_formats: Vec<String>,
}

impl RecordNormalizer {
    /// Create a normalizer with the default date formats.
    pub fn new() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Create a normalizer accepting only the given `chrono` formats.
    pub fn with_date_formats(formats: &[&str]) -> Self {
        Self {
            date_formats: formats.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Parse a date with the first matching format. Month names are
    /// accepted in any case ("01-FEB-2024").
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        let title = title_case_month(raw);
        self.date_formats.iter().find_map(|fmt| {
            NaiveDate::parse_from_str(raw, fmt)
                .or_else(|_| NaiveDate::parse_from_str(&title, fmt))
                .ok()
        })
    }

    /// Build a table for `instrument` from a header and text rows.
    pub fn normalize(
        &self,
        instrument: &str,
        headers: &[&str],
        rows: &[Vec<String>],
    ) -> Result<(TimeSeriesTable, NormalizationStats)> {
        let names: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();
        let date_idx = names
            .iter()
            .position(|n| n == DATE_COLUMN)
            .ok_or_else(|| Error::missing_column(DATE_COLUMN))?;

        let mut stats = NormalizationStats {
            rows_in: rows.len(),
            ..Default::default()
        };
        let mut dates = Vec::with_capacity(rows.len());
        let mut columns: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); names.len()];

        for (line, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                stats.ragged_rows += 1;
                warn!(instrument, line, cells = row.len(), expected = names.len(), "ragged record dropped");
                continue;
            }
            let Some(date) = self.parse_date(&row[date_idx]) else {
                stats.bad_dates += 1;
                warn!(instrument, line, raw = %row[date_idx], "unparseable date, record dropped");
                continue;
            };

            dates.push(date);
            for (idx, raw) in row.iter().enumerate() {
                if idx != date_idx {
                    columns[idx].push(parse_cell(raw));
                }
            }
        }
        stats.rows_kept = dates.len();

        let mut table = TimeSeriesTable::with_dates(instrument, dates);
        for (idx, (name, cells)) in names.iter().zip(columns).enumerate() {
            if idx == date_idx {
                continue;
            }
            if table.has_column(name) {
                warn!(instrument, column = %name, "duplicate header ignored");
                continue;
            }
            table.set_column(name, cells)?;
        }

        debug!(instrument, kept = stats.rows_kept, dropped = stats.rows_dropped(), "normalized records");
        Ok((table, stats))
    }
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a raw text field to a cell.
fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    let cell = Cell::Text(trimmed.to_string());
    match cell.as_f64() {
        Some(v) => Cell::Number(v),
        None => cell,
    }
}

/// "01-FEB-2024" -> "01-Feb-2024" so `%b` can match.
fn title_case_month(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for c in raw.chars() {
        if c.is_ascii_alphabetic() {
            if prev_alpha {
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c.to_ascii_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
