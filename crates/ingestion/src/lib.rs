//! Extraction-side helpers for the footprint scanner.
//!
//! This crate handles:
//! - Raw record normalization (header clean-up, date parsing, numeric cells)
//! - Trading calendar generation and calendar alignment
//! - Volume-weighted average price

pub mod calendar;
pub mod normalizer;
pub mod vwap;

pub use calendar::{align_to_calendar, get_trading_days};
pub use normalizer::{NormalizationStats, RecordNormalizer};
pub use vwap::{calculate_vwap, VwapAccumulator};
