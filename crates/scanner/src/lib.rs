//! Multi-instrument scanning for the footprint scanner.
//!
//! This crate provides:
//! - Parallel fan-out of the feature pipeline across instruments
//! - Per-instrument failure isolation
//! - Scan summaries (pattern category counts, top composite scores)
//! - JSON hand-off for the report generator

pub mod scanner;
pub mod summary;

pub use scanner::{MarketScanner, ScanResult};
pub use summary::{PatternCategory, RankedInstrument, ScanSummary, SummaryCalculator};
