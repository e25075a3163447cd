//! Configuration structures for the footprint scanner.
//!
//! Threshold values are deployment choices; the defaults below are only a
//! starting point for tests and local runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{z_score_column, COMPOSITE_COLUMN};

/// Main configuration for the scanner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rolling baseline configuration.
    pub baseline: BaselineConfig,
    /// Composite score configuration.
    pub composite: CompositeConfig,
    /// Pattern detection configuration.
    pub pattern: PatternConfig,
    /// Percentage-change enrichment configuration.
    pub change: ChangeConfig,
    /// VWAP configuration.
    pub vwap: VwapConfig,
    /// Fan-out configuration.
    pub scan: ScanConfig,
}

impl Config {
    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject parameter combinations the engine cannot apply.
    pub fn validate(&self) -> Result<()> {
        if self.baseline.window == 0 {
            return Err(Error::config("baseline.window must be at least 1"));
        }
        if self.composite.inputs.is_empty() {
            return Err(Error::config("composite.inputs must name at least one column"));
        }
        self.pattern.validate()
    }
}

/// Rolling baseline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Trailing window length in records.
    pub window: usize,
    /// Metrics to baseline (e.g., delivery percentage and quantity).
    pub metrics: Vec<String>,
    /// Optional sub-series keys (e.g., expiry, strike).
    pub group_by: Vec<String>,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            window: 20,
            metrics: vec!["DELIV_PER".to_string(), "DELIV_QTY".to_string()],
            group_by: Vec::new(),
        }
    }
}

/// Composite score configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Z-score columns to fuse.
    pub inputs: Vec<String>,
    /// Output column name.
    pub output: String,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            inputs: BaselineConfig::default()
                .metrics
                .iter()
                .map(|m| z_score_column(m))
                .collect(),
            output: COMPOSITE_COLUMN.to_string(),
        }
    }
}

/// Pattern detection configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Composite score at or above which a day counts as a breach.
    pub threshold: f64,
    /// Scattered lookback length (L).
    pub lookback: usize,
    /// Minimum breaches within the lookback (k).
    pub min_hits: usize,
    /// Required consecutive run length (c).
    pub consecutive: usize,
}

impl PatternConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(Error::config("pattern.threshold must be finite"));
        }
        if self.lookback == 0 {
            return Err(Error::config("pattern.lookback must be at least 1"));
        }
        if self.consecutive == 0 {
            return Err(Error::config("pattern.consecutive must be at least 1"));
        }
        if self.min_hits == 0 || self.min_hits > self.lookback {
            return Err(Error::config(format!(
                "pattern.min_hits must be in 1..={}, got {}",
                self.lookback, self.min_hits
            )));
        }
        Ok(())
    }

    /// Records at the start of a series on which no pattern can be
    /// confirmed. A run of `c` days completes at record `c - 1` at the
    /// earliest; see [`Self::scattered_warmup`] for the scattered side.
    pub fn warmup(&self) -> usize {
        self.lookback.min(self.consecutive).saturating_sub(1)
    }

    /// Records before the first full `lookback` window. Scattered patterns
    /// are only evaluated on a full window.
    pub fn scattered_warmup(&self) -> usize {
        self.lookback.saturating_sub(1)
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            threshold: 2.0,
            lookback: 7,
            min_hits: 3,
            consecutive: 3,
        }
    }
}

/// Percentage-change enrichment configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeConfig {
    /// Metrics to compute changes for. Empty disables the step.
    pub metrics: Vec<String>,
    /// Optional partition keys.
    pub group_by: Vec<String>,
}

/// VWAP configuration. Both columns must be set to compute VWAP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VwapConfig {
    pub price: Option<String>,
    pub volume: Option<String>,
}

/// Fan-out configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of parallel workers (0 = auto).
    pub workers: usize,
}
