//! Rolling baselines and Z-scores.
//!
//! For each target metric adds `ROLLING_MEDIAN_<M>`, `ROLLING_MEAN_<M>`,
//! `ROLLING_STD_<M>` and `<M>_Z_SCORE`. The computation is causal: the
//! baseline at a date only sees the most recent `window` records up to and
//! including that date (within the same group when grouping keys are set).

use footprint_core::config::BaselineConfig;
use footprint_core::{
    normalize_column_name, rolling_mean_column, rolling_median_column, rolling_std_column,
    z_score_column, Error, Result, TimeSeriesTable,
};
use tracing::{debug, warn};

use crate::rolling::RollingWindow;
use crate::transform::{Outcome, TableTransform};

/// Rolling baseline computer.
#[derive(Debug, Clone)]
pub struct BaselineComputer {
    /// Trailing window length in records.
    window: usize,
    /// Metrics to baseline.
    metrics: Vec<String>,
    /// Sub-series keys.
    group_by: Vec<String>,
}

impl BaselineComputer {
    /// Create a computer for `metrics` over a trailing `window`.
    pub fn new(window: usize, metrics: &[&str]) -> Self {
        Self {
            window,
            metrics: metrics.iter().map(|m| normalize_column_name(m)).collect(),
            group_by: Vec::new(),
        }
    }

    pub fn from_config(config: &BaselineConfig) -> Self {
        Self {
            window: config.window,
            metrics: config.metrics.iter().map(|m| normalize_column_name(m)).collect(),
            group_by: config.group_by.iter().map(|k| normalize_column_name(k)).collect(),
        }
    }

    /// Scope the window to sub-series sharing the same key values.
    pub fn with_group_by(mut self, keys: &[&str]) -> Self {
        self.group_by = keys.iter().map(|k| normalize_column_name(k)).collect();
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Minimum present observations for a window position to be defined.
    pub fn min_periods(&self) -> usize {
        (self.window + 1) / 2
    }
}

impl TableTransform for BaselineComputer {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn compute(&self, table: &TimeSeriesTable) -> Result<Outcome> {
        if self.window == 0 {
            return Err(Error::invalid_parameter("baseline window must be at least 1"));
        }
        if table.len() < self.window {
            warn!(
                instrument = table.instrument(),
                rows = table.len(),
                window = self.window,
                "insufficient data for rolling statistics"
            );
            return Ok(Outcome::unchanged(
                table,
                Error::insufficient_data(format!(
                    "{} rows < window {}",
                    table.len(),
                    self.window
                )),
            ));
        }

        let (mut sorted, ranges) = table.grouped(&self.group_by)?;
        let mut outcome_warnings = Vec::new();

        for metric in &self.metrics {
            let numeric = match sorted.numeric(metric) {
                Ok(n) => n,
                Err(e) => {
                    warn!(instrument = table.instrument(), error = %e, "baseline metric skipped");
                    outcome_warnings.push(e);
                    continue;
                }
            };
            if numeric.coerced > 0 {
                warn!(
                    instrument = table.instrument(),
                    column = %metric,
                    count = numeric.coerced,
                    "non-numeric values treated as absent"
                );
                outcome_warnings.push(Error::NumericCoercion {
                    column: metric.clone(),
                    count: numeric.coerced,
                });
            }

            let n = sorted.len();
            let mut medians = vec![None; n];
            let mut means = vec![None; n];
            let mut stds = vec![None; n];
            let mut z_scores = vec![None; n];

            for range in &ranges {
                let mut window = RollingWindow::new(self.window);
                for row in range.clone() {
                    let value = numeric.values[row];
                    let (baseline, z_score) = window.push_scored(value);

                    if let Some(b) = baseline {
                        medians[row] = Some(b.median);
                        means[row] = Some(b.mean);
                        stds[row] = b.std;
                    }
                    z_scores[row] = z_score;
                }
            }

            sorted.set_numeric(&rolling_median_column(metric), medians)?;
            sorted.set_numeric(&rolling_mean_column(metric), means)?;
            sorted.set_numeric(&rolling_std_column(metric), stds)?;
            sorted.set_numeric(&z_score_column(metric), z_scores)?;
        }

        debug!(
            instrument = table.instrument(),
            window = self.window,
            groups = ranges.len(),
            "computed rolling baselines"
        );

        Ok(Outcome {
            table: sorted,
            warnings: outcome_warnings,
        })
    }
}
