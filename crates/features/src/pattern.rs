//! Consecutive and scattered accumulation pattern detection.
//!
//! A day "breaches" when its composite score is defined and at or above the
//! threshold. Two patterns are reported:
//! - consecutive: every day of a run of at least `c` breaching days (the
//!   event window spans the run up to the day it was confirmed);
//! - scattered: at least `k` of the last `L` days breached.
//!
//! A date matching both is reported as consecutive only. Patterns are
//! confirmed at the end of their window, so no window ends within the
//! first `min(L, c) - 1` records.

use std::collections::VecDeque;

use chrono::NaiveDate;
use footprint_core::config::PatternConfig;
use footprint_core::{PatternKind, Result, TimeSeriesTable, TriggerEvent, TriggerSet};
use tracing::debug;

/// Scans a composite-score series for threshold-breach patterns.
#[derive(Debug, Clone, Copy)]
pub struct PatternDetector {
    params: PatternConfig,
}

impl PatternDetector {
    /// Create a detector, validating the parameters.
    pub fn new(params: PatternConfig) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PatternConfig {
        &self.params
    }

    /// Whether a score counts as a breach.
    #[inline]
    pub fn is_breach(&self, score: Option<f64>) -> bool {
        score.is_some_and(|s| s >= self.params.threshold)
    }

    /// Detect patterns on a table's composite column. An empty table or a
    /// missing column yields no events.
    pub fn detect(&self, table: &TimeSeriesTable, composite_col: &str) -> TriggerSet {
        if table.is_empty() || !table.has_column(composite_col) {
            debug!(
                instrument = table.instrument(),
                column = composite_col,
                "no composite scores to scan"
            );
            return TriggerSet::default();
        }

        let sorted;
        let table = if table.is_sorted_by_date() {
            table
        } else {
            sorted = table.sorted_by_date();
            &sorted
        };

        let scores = match table.numeric(composite_col) {
            Ok(n) => n.values,
            Err(_) => return TriggerSet::default(),
        };
        let triggers = self.detect_series(table.dates(), &scores);

        debug!(
            instrument = table.instrument(),
            consecutive = triggers.consecutive.len(),
            scattered = triggers.scattered.len(),
            "scanned composite scores"
        );
        triggers
    }

    /// Single left-to-right pass over a date-ordered score series.
    pub fn detect_series(&self, dates: &[NaiveDate], scores: &[Option<f64>]) -> TriggerSet {
        let PatternConfig {
            lookback,
            min_hits,
            consecutive,
            ..
        } = self.params;

        let mut triggers = TriggerSet::default();
        let mut window: VecDeque<bool> = VecDeque::with_capacity(lookback + 1);
        let mut hits = 0usize;
        let mut run = 0usize;

        for (i, (&date, &score)) in dates.iter().zip(scores).enumerate() {
            let breach = self.is_breach(score);

            window.push_back(breach);
            if breach {
                hits += 1;
            }
            if window.len() > lookback && window.pop_front() == Some(true) {
                hits -= 1;
            }
            run = if breach { run + 1 } else { 0 };

            if run >= consecutive {
                let run_start = dates[i + 1 - run];
                if run == consecutive {
                    // The run just qualified: its earlier days move over
                    // from the scattered list.
                    while triggers.scattered.last().is_some_and(|e| e.date >= run_start) {
                        triggers.scattered.pop();
                    }
                    for &member in &dates[i + 1 - run..i] {
                        triggers.consecutive.push(TriggerEvent {
                            date: member,
                            kind: PatternKind::Consecutive,
                            window_start: run_start,
                            window_end: date,
                        });
                    }
                }
                triggers.consecutive.push(TriggerEvent {
                    date,
                    kind: PatternKind::Consecutive,
                    window_start: run_start,
                    window_end: date,
                });
            } else if window.len() == lookback && hits >= min_hits {
                triggers.scattered.push(TriggerEvent {
                    date,
                    kind: PatternKind::Scattered,
                    window_start: dates[i + 1 - lookback],
                    window_end: date,
                });
            }
        }

        triggers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use footprint_core::{Cell, COMPOSITE_COLUMN};

    fn dates(n: usize) -> Vec<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .iter_days()
            .take(n)
            .collect()
    }

    fn detector(lookback: usize, min_hits: usize, consecutive: usize) -> PatternDetector {
        PatternDetector::new(PatternConfig {
            threshold: 2.0,
            lookback,
            min_hits,
            consecutive,
        })
        .unwrap()
    }

    fn scores(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|v| Some(*v)).collect()
    }

    #[test]
    fn test_reference_scenario() {
        let d = dates(7);
        let s = scores(&[0.5, 2.1, 2.3, 2.0, 0.1, 2.5, 0.4]);
        let triggers = detector(7, 3, 3).detect_series(&d, &s);

        assert_eq!(triggers.consecutive_dates(), vec![d[1], d[2], d[3]]);
        for run in &triggers.consecutive {
            assert_eq!(run.window_start, d[1]);
            assert_eq!(run.window_end, d[3]);
        }

        assert_eq!(triggers.scattered_dates(), vec![d[6]]);
        assert_eq!(triggers.scattered[0].window_start, d[0]);
    }

    #[test]
    fn test_run_longer_than_required() {
        let d = dates(5);
        let s = scores(&[3.0, 3.0, 3.0, 3.0, 0.0]);
        let triggers = detector(10, 1, 2).detect_series(&d, &s);
        assert_eq!(triggers.consecutive_dates(), vec![d[0], d[1], d[2], d[3]]);
        assert_eq!(triggers.consecutive[3].window_start, d[0]);
        assert_eq!(triggers.consecutive[3].window_end, d[3]);
        // Lookback of 10 is never filled.
        assert!(triggers.scattered.is_empty());
    }

    #[test]
    fn test_consecutive_takes_precedence() {
        let d = dates(6);
        let s = scores(&[2.5, 2.5, 2.5, 2.5, 2.5, 2.5]);
        let triggers = detector(3, 2, 3).detect_series(&d, &s);
        assert_eq!(triggers.consecutive.len(), 6);
        assert!(triggers.scattered.is_empty());
        for event in &triggers.consecutive {
            assert!(!triggers.scattered_dates().contains(&event.date));
        }
    }

    #[test]
    fn test_run_claims_scattered_dates() {
        let d = dates(5);
        let s = scores(&[3.0, 0.0, 3.0, 3.0, 3.0]);
        let triggers = detector(3, 2, 3).detect_series(&d, &s);
        // d2 and d3 were scattered until the run reached three days.
        assert_eq!(triggers.consecutive_dates(), vec![d[2], d[3], d[4]]);
        assert!(triggers.scattered.is_empty());
        for event in &triggers.consecutive {
            assert_eq!(event.window_start, d[2]);
            assert_eq!(event.window_end, d[4]);
        }
    }

    #[test]
    fn test_scattered_needs_full_lookback() {
        let d = dates(6);
        let s = scores(&[3.0, 3.0, 0.0, 0.0, 0.0, 0.0]);
        let det = detector(5, 2, 3);
        let triggers = det.detect_series(&d, &s);
        // Two hits sit in the window from d1 on, but it is only full at d4.
        assert_eq!(triggers.scattered_dates(), vec![d[4]]);
        assert_eq!(det.params().scattered_warmup(), 4);
        assert!(triggers.consecutive.is_empty());
    }

    #[test]
    fn test_scattered_sliding_window() {
        let d = dates(8);
        let s = scores(&[2.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
        let triggers = detector(3, 2, 5).detect_series(&d, &s);
        // Only the window ending at index 2 holds two breaches.
        assert_eq!(triggers.scattered_dates(), vec![d[2]]);
        assert_eq!(triggers.scattered[0].window_start, d[0]);
        assert!(triggers.consecutive.is_empty());
    }

    #[test]
    fn test_boundary_warmup_excluded() {
        let d = dates(4);
        let s = scores(&[5.0, 5.0, 5.0, 5.0]);
        let det = detector(4, 1, 3);
        let triggers = det.detect_series(&d, &s);
        // No pattern is confirmed within the first min(L, c) - 1 = 2 records.
        let warmup = det.params().warmup();
        assert_eq!(warmup, 2);
        for event in triggers.chronological() {
            assert!(event.window_end >= d[warmup]);
        }
        assert_eq!(triggers.consecutive_dates(), d);
        assert_eq!(triggers.consecutive[0].window_end, d[2]);
    }

    #[test]
    fn test_missing_scores_never_breach() {
        let d = dates(4);
        let s = vec![Some(3.0), None, Some(3.0), Some(f64::NAN)];
        let det = detector(2, 2, 2);
        assert!(!det.is_breach(None));
        assert!(!det.is_breach(Some(f64::NAN)));
        let triggers = det.detect_series(&d, &s);
        assert!(triggers.is_empty());
    }

    #[test]
    fn test_empty_or_missing_column() {
        let det = detector(7, 3, 3);
        let empty = TimeSeriesTable::new("INFY");
        assert!(det.detect(&empty, COMPOSITE_COLUMN).is_empty());

        let no_col = TimeSeriesTable::with_dates("INFY", dates(3));
        assert!(det.detect(&no_col, COMPOSITE_COLUMN).is_empty());
    }

    #[test]
    fn test_detect_sorts_table() {
        let mut d = dates(3);
        d.reverse();
        let table = TimeSeriesTable::with_dates("INFY", d.clone())
            .with_column(
                COMPOSITE_COLUMN,
                vec![Cell::Number(0.0), Cell::Number(3.0), Cell::Number(3.0)],
            )
            .unwrap();
        // Ascending order: 3.0, 3.0, 0.0.
        let triggers = detector(3, 3, 2).detect(&table, COMPOSITE_COLUMN);
        assert_eq!(triggers.consecutive_dates(), vec![d[2], d[1]]);
    }

    #[test]
    fn test_invalid_params() {
        assert!(PatternDetector::new(PatternConfig {
            threshold: 2.0,
            lookback: 3,
            min_hits: 4,
            consecutive: 2,
        })
        .is_err());
    }
}
