//! Volume-weighted average price.

use footprint_core::TimeSeriesTable;
use tracing::warn;

/// Running VWAP over valid (price, volume) pairs.
#[derive(Debug, Clone, Default)]
pub struct VwapAccumulator {
    numerator: f64,
    volume: f64,
    rows: usize,
}

impl VwapAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observation. Rows with a missing field or non-positive volume
    /// are ignored; returns whether the row was used.
    pub fn add(&mut self, price: Option<f64>, volume: Option<f64>) -> bool {
        match (price, volume) {
            (Some(price), Some(volume)) if volume > 0.0 => {
                self.numerator += price * volume;
                self.volume += volume;
                self.rows += 1;
                true
            }
            _ => false,
        }
    }

    /// Current VWAP, if any valid row was added.
    pub fn vwap(&self) -> Option<f64> {
        if self.volume > 0.0 {
            Some(self.numerator / self.volume)
        } else {
            None
        }
    }

    /// Number of rows that contributed.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// VWAP of a table's price/volume columns. NaN when no valid row exists or
/// either column is missing.
pub fn calculate_vwap(table: &TimeSeriesTable, price_col: &str, volume_col: &str) -> f64 {
    let (price, volume) = match (table.numeric(price_col), table.numeric(volume_col)) {
        (Ok(p), Ok(v)) => (p, v),
        (Err(e), _) | (_, Err(e)) => {
            warn!(instrument = table.instrument(), error = %e, "VWAP unavailable");
            return f64::NAN;
        }
    };

    let mut acc = VwapAccumulator::new();
    for (p, v) in price.values.iter().zip(&volume.values) {
        acc.add(*p, *v);
    }
    acc.vwap().unwrap_or(f64::NAN)
}
