//! Scan summary.
//!
//! Aggregates per-instrument reports into the counts shown on the report's
//! executive summary.

use footprint_features::InstrumentReport;
use serde::{Deserialize, Serialize};

/// Which trigger kinds an instrument produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    /// Consecutive triggers only.
    Consecutive,
    /// Scattered triggers only.
    Scattered,
    /// Both kinds.
    Both,
    /// No triggers.
    Quiet,
}

impl PatternCategory {
    pub fn of(report: &InstrumentReport) -> Self {
        match (
            report.triggers.consecutive.is_empty(),
            report.triggers.scattered.is_empty(),
        ) {
            (false, true) => PatternCategory::Consecutive,
            (true, false) => PatternCategory::Scattered,
            (false, false) => PatternCategory::Both,
            (true, true) => PatternCategory::Quiet,
        }
    }
}

/// One row of the top-instruments list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedInstrument {
    pub instrument: String,
    pub latest_composite: f64,
    pub category: PatternCategory,
}

/// Scan summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Instruments processed.
    pub total_instruments: u32,
    /// Instruments with at least one recorded issue.
    pub instruments_with_issues: u32,
    /// Instruments with consecutive triggers only.
    pub consecutive_only: u32,
    /// Instruments with scattered triggers only.
    pub scattered_only: u32,
    /// Instruments with both kinds.
    pub both: u32,
    /// Instruments without triggers.
    pub quiet: u32,
    /// Consecutive events across all instruments.
    pub consecutive_events: u32,
    /// Scattered events across all instruments.
    pub scattered_events: u32,
    /// Highest latest composite scores, descending.
    pub top_composite: Vec<RankedInstrument>,
}

/// Summary calculator.
pub struct SummaryCalculator {
    top_n: usize,
}

impl SummaryCalculator {
    /// Create a calculator keeping the `top_n` highest composite scores.
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Calculate the summary from instrument reports.
    pub fn calculate(&self, reports: &[InstrumentReport]) -> ScanSummary {
        let mut summary = ScanSummary {
            total_instruments: reports.len() as u32,
            ..Default::default()
        };

        let mut ranked = Vec::new();
        for report in reports {
            if report.has_issues() {
                summary.instruments_with_issues += 1;
            }
            summary.consecutive_events += report.triggers.consecutive.len() as u32;
            summary.scattered_events += report.triggers.scattered.len() as u32;

            let category = PatternCategory::of(report);
            match category {
                PatternCategory::Consecutive => summary.consecutive_only += 1,
                PatternCategory::Scattered => summary.scattered_only += 1,
                PatternCategory::Both => summary.both += 1,
                PatternCategory::Quiet => summary.quiet += 1,
            }

            if let Some(score) = report.latest_composite {
                ranked.push(RankedInstrument {
                    instrument: report.instrument.clone(),
                    latest_composite: score,
                    category,
                });
            }
        }

        ranked.sort_by(|a, b| {
            b.latest_composite
                .total_cmp(&a.latest_composite)
                .then_with(|| a.instrument.cmp(&b.instrument))
        });
        ranked.truncate(self.top_n);
        summary.top_composite = ranked;

        summary
    }
}
