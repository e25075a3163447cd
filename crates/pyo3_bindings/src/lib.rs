//! PyO3 bindings for the footprint scanner.
//!
//! Exposes the Rust signal engine to the Python extraction and reporting
//! side:
//! - Trading calendar, VWAP and bounded percentage changes
//! - Rolling baselines and composite scores
//! - Pattern detection
//! - Whole-market scans over JSON-encoded tables

use chrono::NaiveDate;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use footprint_core::{
    Config as RustConfig, Error as RustError, RollingBaseline as RustRollingBaseline,
    TimeSeriesTable, TriggerEvent as RustTriggerEvent,
};
use footprint_features::{composite_score, sanitized_change, PatternDetector, RollingWindow};
use footprint_ingestion::VwapAccumulator;
use footprint_scanner::MarketScanner;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn to_py_err(e: RustError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse_dates(dates: &[String]) -> PyResult<Vec<NaiveDate>> {
    dates
        .iter()
        .map(|d| {
            NaiveDate::parse_from_str(d, DATE_FORMAT)
                .map_err(|e| PyValueError::new_err(format!("bad date {:?}: {}", d, e)))
        })
        .collect()
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// Rolling statistics of one window position.
#[pyclass]
#[derive(Clone)]
pub struct RollingBaseline {
    #[pyo3(get)]
    pub median: f64,
    #[pyo3(get)]
    pub mean: f64,
    #[pyo3(get)]
    pub std: Option<f64>,
}

#[pymethods]
impl RollingBaseline {
    /// Z-score of a value against this baseline (0 without volatility).
    fn z_score(&self, value: f64) -> f64 {
        RustRollingBaseline::from(self.clone()).z_score(value)
    }

    fn __repr__(&self) -> String {
        format!(
            "RollingBaseline(median={}, mean={}, std={:?})",
            self.median, self.mean, self.std
        )
    }
}

impl From<RustRollingBaseline> for RollingBaseline {
    fn from(b: RustRollingBaseline) -> Self {
        RollingBaseline {
            median: b.median,
            mean: b.mean,
            std: b.std,
        }
    }
}

impl From<RollingBaseline> for RustRollingBaseline {
    fn from(b: RollingBaseline) -> Self {
        RustRollingBaseline {
            median: b.median,
            mean: b.mean,
            std: b.std,
        }
    }
}

/// A detected accumulation pattern.
#[pyclass]
#[derive(Clone)]
pub struct TriggerEvent {
    #[pyo3(get)]
    pub date: String,
    /// "consecutive" or "scattered".
    #[pyo3(get)]
    pub kind: String,
    #[pyo3(get)]
    pub window_start: String,
    #[pyo3(get)]
    pub window_end: String,
}

#[pymethods]
impl TriggerEvent {
    fn __repr__(&self) -> String {
        format!(
            "TriggerEvent(date={}, kind={}, window={}..{})",
            self.date, self.kind, self.window_start, self.window_end
        )
    }
}

impl From<RustTriggerEvent> for TriggerEvent {
    fn from(e: RustTriggerEvent) -> Self {
        TriggerEvent {
            date: e.date.format(DATE_FORMAT).to_string(),
            kind: e.kind.as_str().to_string(),
            window_start: e.window_start.format(DATE_FORMAT).to_string(),
            window_end: e.window_end.format(DATE_FORMAT).to_string(),
        }
    }
}

// ============================================================================
// Python-exposed Engine Classes
// ============================================================================

/// Causal rolling window over a metric series.
#[pyclass]
pub struct PyRollingWindow {
    inner: RollingWindow,
}

#[pymethods]
impl PyRollingWindow {
    #[new]
    fn new(window: usize) -> PyResult<Self> {
        if window == 0 {
            return Err(PyValueError::new_err("window must be at least 1"));
        }
        Ok(PyRollingWindow {
            inner: RollingWindow::new(window),
        })
    }

    /// Push the next observation and return the baseline including it.
    fn push(&mut self, value: Option<f64>) -> Option<RollingBaseline> {
        self.inner.push(value).map(Into::into)
    }

    /// Z-scores of a whole series, in order.
    fn z_scores(&mut self, values: Vec<Option<f64>>) -> Vec<Option<f64>> {
        values
            .into_iter()
            .map(|value| self.inner.push_scored(value).1)
            .collect()
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    /// Clear all state.
    fn clear(&mut self) {
        self.inner.clear();
    }
}

/// Consecutive and scattered pattern detector.
#[pyclass]
pub struct PyPatternDetector {
    inner: PatternDetector,
}

#[pymethods]
impl PyPatternDetector {
    #[new]
    #[pyo3(signature = (threshold=2.0, lookback=7, min_hits=3, consecutive=3))]
    fn new(threshold: f64, lookback: usize, min_hits: usize, consecutive: usize) -> PyResult<Self> {
        let mut params = RustConfig::default().pattern;
        params.threshold = threshold;
        params.lookback = lookback;
        params.min_hits = min_hits;
        params.consecutive = consecutive;
        Ok(PyPatternDetector {
            inner: PatternDetector::new(params).map_err(to_py_err)?,
        })
    }

    fn is_breach(&self, score: Option<f64>) -> bool {
        self.inner.is_breach(score)
    }

    /// Detect patterns in an ascending series of ISO dates and scores.
    ///
    /// Returns `(consecutive, scattered)` event lists.
    fn detect(
        &self,
        dates: Vec<String>,
        scores: Vec<Option<f64>>,
    ) -> PyResult<(Vec<TriggerEvent>, Vec<TriggerEvent>)> {
        if dates.len() != scores.len() {
            return Err(PyValueError::new_err(format!(
                "{} dates but {} scores",
                dates.len(),
                scores.len()
            )));
        }
        let dates = parse_dates(&dates)?;
        let triggers = self.inner.detect_series(&dates, &scores);
        Ok((
            triggers.consecutive.into_iter().map(Into::into).collect(),
            triggers.scattered.into_iter().map(Into::into).collect(),
        ))
    }
}

/// Running volume-weighted average price.
#[pyclass]
pub struct PyVwapAccumulator {
    inner: VwapAccumulator,
}

#[pymethods]
impl PyVwapAccumulator {
    #[new]
    fn new() -> Self {
        PyVwapAccumulator {
            inner: VwapAccumulator::new(),
        }
    }

    /// Add a row; returns whether it was usable.
    fn add(&mut self, price: Option<f64>, volume: Option<f64>) -> bool {
        self.inner.add(price, volume)
    }

    fn vwap(&self) -> Option<f64> {
        self.inner.vwap()
    }

    fn rows(&self) -> usize {
        self.inner.rows()
    }
}

/// Multi-instrument scanner over JSON-encoded tables.
#[pyclass]
pub struct PyMarketScanner {
    inner: MarketScanner,
}

#[pymethods]
impl PyMarketScanner {
    /// Create from a JSON config string (defaults when omitted).
    #[new]
    #[pyo3(signature = (config_json=None, top_n=10))]
    fn new(config_json: Option<&str>, top_n: usize) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => RustConfig::from_json_str(json).map_err(to_py_err)?,
            None => RustConfig::default(),
        };
        let inner = MarketScanner::new(&config).map_err(to_py_err)?.with_top_n(top_n);
        Ok(PyMarketScanner { inner })
    }

    /// Scan a JSON array of tables and return the scan result as JSON.
    fn scan_json(&self, py: Python<'_>, tables_json: &str) -> PyResult<String> {
        let tables: Vec<TimeSeriesTable> = serde_json::from_str(tables_json)
            .map_err(|e| PyValueError::new_err(format!("bad tables: {}", e)))?;
        let result = py
            .allow_threads(|| self.inner.scan(&tables))
            .map_err(to_py_err)?;
        result.to_json().map_err(to_py_err)
    }
}

// ============================================================================
// Python-exposed Functions
// ============================================================================

/// Weekday dates of a month as ISO strings.
#[pyfunction]
fn get_trading_days(year: i32, month: u32) -> PyResult<Vec<String>> {
    let days = footprint_ingestion::get_trading_days(year, month).map_err(to_py_err)?;
    Ok(days
        .into_iter()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .collect())
}

/// Percentage changes of a series: 0 for the first entry, clipped to ±1000.
#[pyfunction]
fn percentage_changes(values: Vec<Option<f64>>) -> Vec<f64> {
    let mut changes = Vec::with_capacity(values.len());
    let mut prev = None;
    for (i, value) in values.into_iter().enumerate() {
        changes.push(if i == 0 { 0.0 } else { sanitized_change(prev, value) });
        prev = value;
    }
    changes
}

/// Equal-weight composite of one row's Z-scores.
#[pyfunction]
fn composite(z_scores: Vec<Option<f64>>) -> f64 {
    composite_score(&z_scores)
}

/// VWAP of parallel price and volume lists (NaN when undefined).
#[pyfunction]
fn calculate_vwap(prices: Vec<Option<f64>>, volumes: Vec<Option<f64>>) -> f64 {
    let mut acc = VwapAccumulator::new();
    for (price, volume) in prices.into_iter().zip(volumes) {
        acc.add(price, volume);
    }
    acc.vwap().unwrap_or(f64::NAN)
}

// ============================================================================
// Module Definition
// ============================================================================

/// Footprint - institutional accumulation signals in Rust.
#[pymodule]
fn footprint_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<RollingBaseline>()?;
    m.add_class::<TriggerEvent>()?;

    // Engine classes
    m.add_class::<PyRollingWindow>()?;
    m.add_class::<PyPatternDetector>()?;
    m.add_class::<PyVwapAccumulator>()?;
    m.add_class::<PyMarketScanner>()?;

    // Functions
    m.add_function(wrap_pyfunction!(get_trading_days, m)?)?;
    m.add_function(wrap_pyfunction!(percentage_changes, m)?)?;
    m.add_function(wrap_pyfunction!(composite, m)?)?;
    m.add_function(wrap_pyfunction!(calculate_vwap, m)?)?;

    Ok(())
}
