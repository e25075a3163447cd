use chrono::NaiveDate;
use footprint_core::{Cell, Config, TimeSeriesTable, COMPOSITE_COLUMN};
use footprint_scanner::{MarketScanner, PatternCategory, ScanResult};

fn config() -> Config {
    let mut config = Config::default();
    config.baseline.window = 4;
    config.pattern.threshold = 1.0;
    config.pattern.lookback = 4;
    config.pattern.min_hits = 2;
    config.pattern.consecutive = 2;
    config.vwap.price = Some("CLOSE".into());
    config.vwap.volume = Some("VOLUME".into());
    config.scan.workers = 2;
    config
}

fn dates(n: usize) -> Vec<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .iter_days()
        .take(n)
        .collect()
}

fn column(n: usize, f: impl Fn(usize) -> f64) -> Vec<Cell> {
    (0..n).map(|i| Cell::Number(f(i))).collect()
}

/// Flat delivery history, optionally ending in a two-day surge.
fn instrument(name: &str, n: usize, surge: bool) -> TimeSeriesTable {
    let ramp = move |i: usize, base: f64| match (surge, n - i) {
        (true, 2) => base * 2.25,
        (true, 1) => base * 3.75,
        _ => base,
    };
    TimeSeriesTable::with_dates(name, dates(n))
        .with_column("CLOSE", column(n, |i| 100.0 + i as f64))
        .unwrap()
        .with_column("VOLUME", column(n, |_| 10.0))
        .unwrap()
        .with_column("DELIV_PER", column(n, |i| ramp(i, 40.0)))
        .unwrap()
        .with_column("DELIV_QTY", column(n, |i| ramp(i, 1000.0)))
        .unwrap()
}

fn scan(tables: &[TimeSeriesTable]) -> ScanResult {
    MarketScanner::new(&config())
        .unwrap()
        .with_top_n(2)
        .scan(tables)
        .unwrap()
}

#[test]
fn test_scan_end_to_end() {
    let tables = vec![
        instrument("TCS", 12, false),
        instrument("RELIANCE", 12, true),
        instrument("INFY", 12, false),
    ];
    let result = scan(&tables);

    let names: Vec<&str> = result.reports.iter().map(|r| r.instrument.as_str()).collect();
    assert_eq!(names, vec!["INFY", "RELIANCE", "TCS"]);

    let reliance = result.report("RELIANCE").unwrap();
    assert_eq!(reliance.triggers.consecutive.len(), 2);
    assert!(reliance.table.has_column(COMPOSITE_COLUMN));
    assert_eq!(reliance.vwap, Some(105.5));

    let summary = &result.summary;
    assert_eq!(summary.total_instruments, 3);
    assert_eq!(summary.consecutive_only, 1);
    assert_eq!(summary.quiet, 2);
    assert_eq!(summary.instruments_with_issues, 0);
    assert_eq!(summary.top_composite.len(), 2);
    assert_eq!(summary.top_composite[0].instrument, "RELIANCE");
    assert_eq!(summary.top_composite[0].category, PatternCategory::Consecutive);
}

#[test]
fn test_failures_are_isolated() {
    let missing_metric = TimeSeriesTable::with_dates("WIPRO", dates(12))
        .with_column("DELIV_PER", column(12, |_| 40.0))
        .unwrap();
    let mut repeated_dates = dates(12);
    repeated_dates[11] = repeated_dates[10];
    let repeated = TimeSeriesTable::with_dates("ITC", repeated_dates)
        .with_column("DELIV_PER", column(12, |_| 40.0))
        .unwrap()
        .with_column("DELIV_QTY", column(12, |_| 1000.0))
        .unwrap();

    let tables = vec![instrument("RELIANCE", 12, true), missing_metric, repeated];
    let result = scan(&tables);

    assert_eq!(result.summary.total_instruments, 3);
    assert_eq!(result.summary.instruments_with_issues, 2);

    let wipro = result.report("WIPRO").unwrap();
    assert!(wipro.triggers.is_empty());
    assert!(wipro.issues.iter().any(|i| i.starts_with("composite:")));
    assert!(wipro.table.has_column("DELIV_PER_Z_SCORE"));

    let itc = result.report("ITC").unwrap();
    assert!(itc.issues[0].starts_with("input:"));

    // The healthy instrument is unaffected by its neighbours.
    let alone = scan(&[instrument("RELIANCE", 12, true)]);
    assert_eq!(result.report("RELIANCE"), alone.report("RELIANCE"));
}

#[test]
fn test_ragged_table_is_rejected_on_load() {
    let ragged = serde_json::from_str::<Vec<TimeSeriesTable>>(
        r#"[{
            "instrument": "ITC",
            "dates": ["2024-01-01", "2024-01-02"],
            "columns": [{"name": "DELIV_PER", "cells": [1.0]}]
        }]"#,
    );
    assert!(ragged.is_err());
}

#[test]
fn test_scan_is_deterministic() {
    let tables: Vec<TimeSeriesTable> = ["A", "B", "C", "D", "E"]
        .iter()
        .enumerate()
        .map(|(i, name)| instrument(name, 10 + i, i % 2 == 0))
        .collect();

    let first = scan(&tables).to_json().unwrap();
    let mut reversed = tables.clone();
    reversed.reverse();
    let second = scan(&reversed).to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_scan() {
    let result = scan(&[]);
    assert!(result.reports.is_empty());
    assert_eq!(result.summary.total_instruments, 0);
}
