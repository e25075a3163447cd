//! Core types and configuration for the footprint scanner.
//!
//! This crate provides shared types used across all other crates:
//! - The per-instrument daily time-series table
//! - Trigger events emitted by pattern detection
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod table;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use table::{
    normalize_column_name, Cell, Column, GroupKey, KeyPart, NumericColumn, TimeSeriesTable,
    DATE_COLUMN,
};
pub use types::*;
