//! Bounded, gap-safe percentage changes.
//!
//! Adds `<M>_CHANGE_%` per metric: the change from the previous record of
//! the same group, in percent, clipped to ±1000 and rounded to 2 decimals.
//! Undefined changes (first record of a group, a missing side, 0 → 0) are 0.

use footprint_core::config::ChangeConfig;
use footprint_core::{change_column, normalize_column_name, Error, Result, TimeSeriesTable, CHANGE_CLIP};
use tracing::{debug, warn};

use crate::transform::{Outcome, TableTransform};

/// Percentage change between two consecutive observations.
///
/// Division by a zero prior value saturates at the clip bound of matching
/// sign instead of producing an infinity.
pub fn sanitized_change(prev: Option<f64>, current: Option<f64>) -> f64 {
    let (Some(prev), Some(current)) = (prev, current) else {
        return 0.0;
    };
    let raw = (current - prev) / prev * 100.0;
    if raw.is_nan() {
        return 0.0;
    }
    let rounded = (raw.clamp(-CHANGE_CLIP, CHANGE_CLIP) * 100.0).round() / 100.0;
    // Normalize -0.0 so identical inputs serialize identically.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Percentage-change enrichment step.
#[derive(Debug, Clone)]
pub struct ChangeSanitizer {
    metrics: Vec<String>,
    group_by: Vec<String>,
}

impl ChangeSanitizer {
    pub fn new(metrics: &[&str]) -> Self {
        Self {
            metrics: metrics.iter().map(|m| normalize_column_name(m)).collect(),
            group_by: Vec::new(),
        }
    }

    pub fn from_config(config: &ChangeConfig) -> Self {
        Self {
            metrics: config.metrics.iter().map(|m| normalize_column_name(m)).collect(),
            group_by: config.group_by.iter().map(|k| normalize_column_name(k)).collect(),
        }
    }

    /// Partition by these keys before differencing.
    pub fn with_group_by(mut self, keys: &[&str]) -> Self {
        self.group_by = keys.iter().map(|k| normalize_column_name(k)).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }
}

impl TableTransform for ChangeSanitizer {
    fn name(&self) -> &'static str {
        "change"
    }

    fn compute(&self, table: &TimeSeriesTable) -> Result<Outcome> {
        let (mut sorted, ranges) = table.grouped(&self.group_by)?;
        let mut warnings = Vec::new();

        for metric in &self.metrics {
            let numeric = sorted.numeric(metric)?;
            if numeric.coerced > 0 {
                warn!(
                    instrument = table.instrument(),
                    column = %metric,
                    count = numeric.coerced,
                    "non-numeric values treated as absent"
                );
                warnings.push(Error::NumericCoercion {
                    column: metric.clone(),
                    count: numeric.coerced,
                });
            }

            let mut changes = vec![Some(0.0); sorted.len()];
            for range in &ranges {
                for row in (range.start + 1)..range.end {
                    changes[row] = Some(sanitized_change(numeric.values[row - 1], numeric.values[row]));
                }
            }
            sorted.set_numeric(&change_column(metric), changes)?;
        }

        debug!(
            instrument = table.instrument(),
            metrics = self.metrics.len(),
            groups = ranges.len(),
            "computed percentage changes"
        );

        Ok(Outcome {
            table: sorted,
            warnings,
        })
    }
}
