//! Trailing-window statistics.
//!
//! Keeps the last `window` observations (present or absent) and computes
//! median, mean and sample standard deviation over the present ones.

use std::collections::VecDeque;

use footprint_core::RollingBaseline;
use statrs::statistics::{Data, Median, Statistics};

/// Trailing window of optional observations.
pub struct RollingWindow {
    /// Window size in records.
    window: usize,
    /// Minimum present observations for the statistics to be defined.
    min_periods: usize,
    /// Most recent observations, oldest first.
    values: VecDeque<Option<f64>>,
}

impl RollingWindow {
    /// Create a window requiring at least `ceil(window / 2)` observations.
    pub fn new(window: usize) -> Self {
        Self::with_min_periods(window, (window + 1) / 2)
    }

    /// Create a window with an explicit minimum observation count.
    pub fn with_min_periods(window: usize, min_periods: usize) -> Self {
        Self {
            window,
            min_periods: min_periods.max(1),
            values: VecDeque::with_capacity(window),
        }
    }

    /// Add an observation and return the baseline of the window ending at it.
    pub fn push(&mut self, value: Option<f64>) -> Option<RollingBaseline> {
        if self.values.len() >= self.window {
            self.values.pop_front();
        }
        self.values.push_back(value.filter(|v| v.is_finite()));
        self.baseline()
    }

    /// Add an observation and return the baseline together with the
    /// observation's Z-score. Before the window has enough observations the
    /// Z-score is 0.
    pub fn push_scored(&mut self, value: Option<f64>) -> (Option<RollingBaseline>, Option<f64>) {
        let baseline = self.push(value);
        let z_score = match baseline {
            Some(b) => b.z_score_of(value),
            None => Some(0.0),
        };
        (baseline, z_score)
    }

    /// Baseline of the current window, if enough observations are present.
    pub fn baseline(&self) -> Option<RollingBaseline> {
        let present: Vec<f64> = self.values.iter().flatten().copied().collect();
        if present.is_empty() || present.len() < self.min_periods {
            return None;
        }

        let mean = present.iter().mean();
        let flat = present.iter().all(|v| *v == present[0]);
        let std = match present.len() {
            1 => None,
            // A flat window is exactly zero, not accumulated rounding noise.
            _ if flat => Some(0.0),
            _ => Some(present.iter().std_dev()),
        };
        let median = Data::new(present).median();

        Some(RollingBaseline { median, mean, std })
    }

    /// Number of present observations in the window.
    pub fn count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Check if the window is full.
    pub fn is_ready(&self) -> bool {
        self.values.len() >= self.window
    }

    pub fn min_periods(&self) -> usize {
        self.min_periods
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
