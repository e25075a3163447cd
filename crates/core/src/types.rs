//! Core data types for the footprint scanner.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::table::normalize_column_name;

/// Default name of the fused anomaly score column.
pub const COMPOSITE_COLUMN: &str = "COMPOSITE_Z_SCORE";

/// Upper/lower bound applied to percentage-change series.
pub const CHANGE_CLIP: f64 = 1000.0;

/// Column holding the trailing-window median of `metric`.
pub fn rolling_median_column(metric: &str) -> String {
    format!("ROLLING_MEDIAN_{}", normalize_column_name(metric))
}

/// Column holding the trailing-window mean of `metric`.
pub fn rolling_mean_column(metric: &str) -> String {
    format!("ROLLING_MEAN_{}", normalize_column_name(metric))
}

/// Column holding the trailing-window standard deviation of `metric`.
pub fn rolling_std_column(metric: &str) -> String {
    format!("ROLLING_STD_{}", normalize_column_name(metric))
}

/// Column holding the Z-score of `metric`.
pub fn z_score_column(metric: &str) -> String {
    format!("{}_Z_SCORE", normalize_column_name(metric))
}

/// Column holding the sanitized percentage change of `metric`.
pub fn change_column(metric: &str) -> String {
    format!("{}_CHANGE_%", normalize_column_name(metric))
}

/// Rolling statistics for one metric at one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingBaseline {
    pub median: f64,
    pub mean: f64,
    /// Sample standard deviation (n - 1). `None` with a single observation.
    pub std: Option<f64>,
}

impl RollingBaseline {
    /// Z-score of `value` against this baseline.
    ///
    /// A flat window (std of zero or undefined) yields 0.
    #[inline]
    pub fn z_score(&self, value: f64) -> f64 {
        match self.std {
            Some(std) if std > 0.0 => (value - self.mean) / std,
            _ => 0.0,
        }
    }

    /// Z-score of a possibly absent value.
    ///
    /// Without volatility the score is 0 whether or not the value is
    /// present; with volatility an absent value has no score.
    #[inline]
    pub fn z_score_of(&self, value: Option<f64>) -> Option<f64> {
        match self.std {
            Some(std) if std > 0.0 => value.map(|v| (v - self.mean) / std),
            _ => Some(0.0),
        }
    }
}

/// Kind of multi-day accumulation pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Contiguous run of threshold-breaching days.
    Consecutive,
    /// At least k breaching days within the last L days.
    Scattered,
}

impl PatternKind {
    /// Get the priority (lower = higher priority).
    /// A date matching both kinds is only reported under the higher one.
    pub fn priority(self) -> u8 {
        match self {
            PatternKind::Consecutive => 1,
            PatternKind::Scattered => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::Consecutive => "consecutive",
            PatternKind::Scattered => "scattered",
        }
    }
}

/// A detected pattern occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Date at which the pattern condition became satisfied.
    pub date: NaiveDate,
    pub kind: PatternKind,
    /// First date of the records that satisfy the condition.
    pub window_start: NaiveDate,
    /// Last date of the records that satisfy the condition (== `date`).
    pub window_end: NaiveDate,
}

/// Trigger events for one instrument, split by kind, each in date order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSet {
    pub consecutive: Vec<TriggerEvent>,
    pub scattered: Vec<TriggerEvent>,
}

impl TriggerSet {
    pub fn is_empty(&self) -> bool {
        self.consecutive.is_empty() && self.scattered.is_empty()
    }

    /// Total number of events.
    pub fn len(&self) -> usize {
        self.consecutive.len() + self.scattered.len()
    }

    pub fn consecutive_dates(&self) -> Vec<NaiveDate> {
        self.consecutive.iter().map(|e| e.date).collect()
    }

    pub fn scattered_dates(&self) -> Vec<NaiveDate> {
        self.scattered.iter().map(|e| e.date).collect()
    }

    /// All events merged in chronological order.
    pub fn chronological(&self) -> Vec<TriggerEvent> {
        let mut all: Vec<TriggerEvent> = self
            .consecutive
            .iter()
            .chain(self.scattered.iter())
            .copied()
            .collect();
        all.sort_by_key(|e| (e.date, e.kind.priority()));
        all
    }

    /// Most recent event, if any.
    pub fn latest(&self) -> Option<TriggerEvent> {
        self.chronological().last().copied()
    }
}
