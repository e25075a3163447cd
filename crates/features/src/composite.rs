//! Composite anomaly score.
//!
//! Averages a fixed set of Z-score columns into one score. A missing input
//! counts as 0 so that one absent signal dilutes rather than erases the
//! others, and a row with no input present scores 0.

use footprint_core::config::CompositeConfig;
use footprint_core::{normalize_column_name, Error, Result, TimeSeriesTable, COMPOSITE_COLUMN};
use tracing::{debug, warn};

use crate::transform::{Outcome, TableTransform};

/// Equal-weight composite of one row's Z-scores.
///
/// Absent inputs count as 0, so a row with nothing present scores 0.
pub fn composite_score(z_scores: &[Option<f64>]) -> f64 {
    if z_scores.is_empty() {
        return 0.0;
    }
    let sum = z_scores.iter().flatten().fold(0.0, |acc, v| acc + v);
    sum / z_scores.len() as f64
}

/// Fuses Z-score columns into a composite score column.
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    inputs: Vec<String>,
    output: String,
}

impl CompositeScorer {
    /// Create a scorer writing to `COMPOSITE_Z_SCORE`.
    pub fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|c| normalize_column_name(c)).collect(),
            output: COMPOSITE_COLUMN.to_string(),
        }
    }

    pub fn from_config(config: &CompositeConfig) -> Self {
        Self {
            inputs: config.inputs.iter().map(|c| normalize_column_name(c)).collect(),
            output: normalize_column_name(&config.output),
        }
    }

    /// Write the score to a different column.
    pub fn with_output(mut self, output: &str) -> Self {
        self.output = normalize_column_name(output);
        self
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn output(&self) -> &str {
        &self.output
    }
}

impl TableTransform for CompositeScorer {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn compute(&self, table: &TimeSeriesTable) -> Result<Outcome> {
        if self.inputs.is_empty() {
            return Err(Error::invalid_parameter("composite score needs at least one input"));
        }

        let mut warnings = Vec::new();
        let mut columns = Vec::with_capacity(self.inputs.len());
        for name in &self.inputs {
            let numeric = table.numeric(name)?;
            if numeric.coerced > 0 {
                warn!(
                    instrument = table.instrument(),
                    column = %name,
                    count = numeric.coerced,
                    "non-numeric Z-scores treated as absent"
                );
                warnings.push(Error::NumericCoercion {
                    column: name.clone(),
                    count: numeric.coerced,
                });
            }
            columns.push(numeric.values);
        }

        let mut row_values = Vec::with_capacity(columns.len());
        let scores: Vec<Option<f64>> = (0..table.len())
            .map(|row| {
                row_values.clear();
                row_values.extend(columns.iter().map(|c| c[row]));
                Some(composite_score(&row_values))
            })
            .collect();

        let mut scored = table.clone();
        scored.set_numeric(&self.output, scores)?;
        debug!(instrument = table.instrument(), output = %self.output, "computed composite score");

        Ok(Outcome {
            table: scored,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use crate::pattern::PatternDetector;
    use footprint_core::config::PatternConfig;
    use footprint_core::Cell;

    fn table() -> TimeSeriesTable {
        let dates = (1..=3)
            .map(|d| NaiveDate::from_ymd_opt(2024, 2, d).unwrap())
            .collect();
        TimeSeriesTable::with_dates("INFY", dates)
            .with_column(
                "DELIV_PER_Z_SCORE",
                vec![Cell::Number(2.0), Cell::Empty, Cell::Empty],
            )
            .unwrap()
            .with_column(
                "DELIV_QTY_Z_SCORE",
                vec![Cell::Number(3.0), Cell::Number(-1.0), Cell::Empty],
            )
            .unwrap()
    }

    #[test]
    fn test_mean_with_missing_as_zero() {
        let scorer = CompositeScorer::new(&["DELIV_PER_Z_SCORE", "DELIV_QTY_Z_SCORE"]);
        let out = scorer.compute(&table()).unwrap().into_table();
        let scores = out.numeric(COMPOSITE_COLUMN).unwrap().values;
        assert_abs_diff_eq!(scores[0].unwrap(), 2.5);
        assert_abs_diff_eq!(scores[1].unwrap(), -0.5);
        assert_eq!(scores[2], Some(0.0));
    }

    #[test]
    fn test_composite_score_row() {
        assert_eq!(composite_score(&[Some(3.0), None]), 1.5);
        assert_eq!(composite_score(&[None, None]), 0.0);
        assert_eq!(composite_score(&[]), 0.0);
        assert_abs_diff_eq!(composite_score(&[Some(1.0), Some(2.0), Some(3.0)]), 2.0);
    }

    #[test]
    fn test_all_missing_row_can_breach() {
        let t = table();
        let out = CompositeScorer::new(&["DELIV_PER_Z_SCORE", "DELIV_QTY_Z_SCORE"])
            .compute(&t)
            .unwrap()
            .into_table();
        let detector = PatternDetector::new(PatternConfig {
            threshold: -1.0,
            lookback: 1,
            min_hits: 1,
            consecutive: 1,
        })
        .unwrap();
        let triggers = detector.detect(&out, COMPOSITE_COLUMN);
        // Row 1 scores -0.5 and row 2 (nothing present) scores 0.
        assert_eq!(triggers.consecutive_dates(), t.dates().to_vec());
    }

    #[test]
    fn test_symmetric() {
        let t = table();
        let ab = CompositeScorer::new(&["DELIV_PER_Z_SCORE", "DELIV_QTY_Z_SCORE"])
            .compute(&t)
            .unwrap()
            .into_table();
        let ba = CompositeScorer::new(&["DELIV_QTY_Z_SCORE", "DELIV_PER_Z_SCORE"])
            .compute(&t)
            .unwrap()
            .into_table();
        assert_eq!(
            ab.numeric(COMPOSITE_COLUMN).unwrap().values,
            ba.numeric(COMPOSITE_COLUMN).unwrap().values
        );
    }

    #[test]
    fn test_missing_column_leaves_table_unchanged() {
        let t = table();
        let scorer = CompositeScorer::new(&["DELIV_PER_Z_SCORE", "OI_Z_SCORE"]);
        assert!(matches!(
            scorer.compute(&t),
            Err(Error::MissingColumn { ref column }) if column == "OI_Z_SCORE"
        ));

        let fallback = scorer.apply(&t);
        assert_eq!(fallback.table, t);
        assert_eq!(fallback.warnings.len(), 1);
    }

    #[test]
    fn test_n_inputs_and_custom_output() {
        let t = table()
            .with_column(
                "OI_Z_SCORE",
                vec![Cell::Number(4.0), Cell::Number(4.0), Cell::Empty],
            )
            .unwrap();
        let out = CompositeScorer::new(&["DELIV_PER_Z_SCORE", "DELIV_QTY_Z_SCORE", "OI_Z_SCORE"])
            .with_output("triple_score")
            .compute(&t)
            .unwrap()
            .into_table();
        let scores = out.numeric("TRIPLE_SCORE").unwrap().values;
        assert_abs_diff_eq!(scores[0].unwrap(), 3.0);
        assert_abs_diff_eq!(scores[1].unwrap(), 1.0);
    }
}
