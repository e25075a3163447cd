//! Multi-instrument scanner.
//!
//! Runs the feature pipeline once per instrument table on a rayon pool.
//! Instruments share no mutable state, so results are simply collected and
//! ordered by instrument id.

use footprint_core::{Config, Error, Result, TimeSeriesTable};
use footprint_features::{FeaturePipeline, InstrumentReport};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::summary::{ScanSummary, SummaryCalculator};

/// Default length of the top-composite list.
const DEFAULT_TOP_N: usize = 10;

/// Output of a scan: per-instrument reports plus the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Reports ordered by instrument id.
    pub reports: Vec<InstrumentReport>,
    pub summary: ScanSummary,
}

impl ScanResult {
    /// Report for one instrument.
    pub fn report(&self, instrument: &str) -> Option<&InstrumentReport> {
        self.reports.iter().find(|r| r.instrument == instrument)
    }

    /// Serialize for the report generator.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Scanner fanning the pipeline out across instruments.
pub struct MarketScanner {
    pipeline: FeaturePipeline,
    /// Number of worker threads (0 = rayon default).
    workers: usize,
    top_n: usize,
}

impl MarketScanner {
    /// Create a scanner from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            pipeline: FeaturePipeline::new(config)?,
            workers: config.scan.workers,
            top_n: DEFAULT_TOP_N,
        })
    }

    /// Keep the `top_n` highest composite scores in the summary.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    /// Process every table independently and merge the results.
    pub fn scan(&self, tables: &[TimeSeriesTable]) -> Result<ScanResult> {
        let run = || -> Vec<InstrumentReport> {
            tables.par_iter().map(|t| self.pipeline.run(t)).collect()
        };

        let mut reports = if self.workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .map_err(|e| Error::Other(format!("failed to build worker pool: {}", e)))?;
            pool.install(run)
        } else {
            run()
        };
        reports.sort_by(|a, b| a.instrument.cmp(&b.instrument));

        for report in reports.iter().filter(|r| r.has_issues()) {
            warn!(
                instrument = %report.instrument,
                issues = ?report.issues,
                "instrument processed with issues"
            );
        }

        let summary = SummaryCalculator::new(self.top_n).calculate(&reports);
        info!(
            instruments = summary.total_instruments,
            consecutive = summary.consecutive_only + summary.both,
            scattered = summary.scattered_only + summary.both,
            with_issues = summary.instruments_with_issues,
            "scan complete"
        );

        Ok(ScanResult { reports, summary })
    }
}
