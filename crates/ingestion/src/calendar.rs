//! Trading calendar helpers.
//!
//! Weekdays only; no exchange holiday calendar is applied.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use footprint_core::{Cell, Error, Result, TimeSeriesTable};
use tracing::debug;

/// Monday to Friday dates of the given month, ascending.
pub fn get_trading_days(year: i32, month: u32) -> Result<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        Error::invalid_parameter(format!("no such month: {}-{:02}", year, month))
    })?;

    Ok(first
        .iter_days()
        .take_while(|d| d.month() == month)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect())
}

/// Reindex a table onto `days`.
///
/// Days without a record become rows of empty cells; records outside `days`
/// are dropped. The table must not contain duplicate dates.
pub fn align_to_calendar(table: &TimeSeriesTable, days: &[NaiveDate]) -> Result<TimeSeriesTable> {
    if !table.has_unique_dates() {
        return Err(Error::data(format!(
            "{}: cannot align a table with duplicate dates",
            table.instrument()
        )));
    }

    let mut calendar: Vec<NaiveDate> = days.to_vec();
    calendar.sort_unstable();
    calendar.dedup();

    let by_date: HashMap<NaiveDate, usize> = table
        .dates()
        .iter()
        .enumerate()
        .map(|(row, date)| (*date, row))
        .collect();

    let mut aligned = TimeSeriesTable::with_dates(table.instrument(), calendar.clone());
    for column in table.columns() {
        let cells: Vec<Cell> = calendar
            .iter()
            .map(|date| match by_date.get(date) {
                Some(&row) => column.cells[row].clone(),
                None => Cell::Empty,
            })
            .collect();
        aligned.set_column(&column.name, cells)?;
    }

    let matched = calendar.iter().filter(|d| by_date.contains_key(d)).count();
    debug!(
        instrument = table.instrument(),
        matched,
        filled = calendar.len() - matched,
        dropped = table.len() - matched,
        "aligned table to calendar"
    );

    Ok(aligned)
}
