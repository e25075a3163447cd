//! Shared contract for table-enrichment steps.

use footprint_core::{Error, Result, TimeSeriesTable};
use tracing::error;

/// Result of a successful step: the new table plus soft warnings
/// (insufficient data, numeric coercion, skipped metrics).
#[derive(Debug)]
pub struct Outcome {
    pub table: TimeSeriesTable,
    pub warnings: Vec<Error>,
}

impl Outcome {
    pub fn new(table: TimeSeriesTable) -> Self {
        Self {
            table,
            warnings: Vec::new(),
        }
    }

    /// The input table returned as-is, with the reason recorded.
    pub fn unchanged(table: &TimeSeriesTable, reason: Error) -> Self {
        Self {
            table: table.clone(),
            warnings: vec![reason],
        }
    }

    pub fn into_table(self) -> TimeSeriesTable {
        self.table
    }
}

/// A pure step that derives a new table from an input table.
pub trait TableTransform {
    /// Short name used in logs and issue reports.
    fn name(&self) -> &'static str;

    /// Run the step. On `Err` the caller still owns the untouched input.
    fn compute(&self, table: &TimeSeriesTable) -> Result<Outcome>;

    /// Run the step, falling back to the unmodified input on failure.
    fn apply(&self, table: &TimeSeriesTable) -> Outcome {
        match self.compute(table) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    step = self.name(),
                    instrument = table.instrument(),
                    error = %e,
                    "step failed, table left unchanged"
                );
                Outcome::unchanged(table, e)
            }
        }
    }
}
