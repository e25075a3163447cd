//! Per-instrument feature pipeline.
//!
//! Chains change enrichment, rolling baselines, composite scoring and
//! pattern detection for one instrument table. Every step degrades to a
//! no-op on failure; problems are collected on the report instead of
//! aborting the instrument.

use footprint_core::{Config, Result, TimeSeriesTable, TriggerSet};
use footprint_ingestion::calculate_vwap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    baseline::BaselineComputer,
    change::ChangeSanitizer,
    composite::CompositeScorer,
    pattern::PatternDetector,
    transform::{Outcome, TableTransform},
};

/// Everything the report side needs for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReport {
    pub instrument: String,
    /// Input table with the requested derived columns.
    pub table: TimeSeriesTable,
    pub triggers: TriggerSet,
    /// VWAP over the whole table, when configured and defined.
    pub vwap: Option<f64>,
    /// Composite score on the most recent date that has one.
    pub latest_composite: Option<f64>,
    /// Soft failures encountered, formatted as `step: error`.
    pub issues: Vec<String>,
}

impl InstrumentReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Feature pipeline for a single instrument.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    change: Option<ChangeSanitizer>,
    baseline: BaselineComputer,
    composite: CompositeScorer,
    detector: PatternDetector,
    vwap: Option<(String, String)>,
}

impl FeaturePipeline {
    /// Create a pipeline from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let change = ChangeSanitizer::from_config(&config.change);
        let vwap = match (&config.vwap.price, &config.vwap.volume) {
            (Some(price), Some(volume)) => Some((price.clone(), volume.clone())),
            _ => None,
        };

        Ok(Self {
            change: (!change.is_empty()).then_some(change),
            baseline: BaselineComputer::from_config(&config.baseline),
            composite: CompositeScorer::from_config(&config.composite),
            detector: PatternDetector::new(config.pattern)?,
            vwap,
        })
    }

    pub fn composite_column(&self) -> &str {
        self.composite.output()
    }

    /// Reject tables with a repeated `(group keys…, date)` record under
    /// either grouping in use.
    fn check_input(&self, table: &TimeSeriesTable) -> Result<()> {
        table.validate()?;
        table.check_unique_records(self.baseline.group_by())?;
        if let Some(change) = &self.change {
            table.check_unique_records(change.group_by())?;
        }
        Ok(())
    }

    /// Run all steps on one table. Never fails; see [`InstrumentReport::issues`].
    pub fn run(&self, table: &TimeSeriesTable) -> InstrumentReport {
        let mut issues = Vec::new();

        if let Err(e) = self.check_input(table) {
            return InstrumentReport {
                instrument: table.instrument().to_string(),
                table: table.clone(),
                triggers: TriggerSet::default(),
                vwap: None,
                latest_composite: None,
                issues: vec![format!("input: {}", e)],
            };
        }

        let mut current = match &self.change {
            Some(change) => absorb(change, change.apply(table), &mut issues),
            None => table.clone(),
        };
        current = absorb(&self.baseline, self.baseline.apply(&current), &mut issues);
        current = absorb(&self.composite, self.composite.apply(&current), &mut issues);

        let triggers = self.detector.detect(&current, self.composite.output());
        let vwap = self
            .vwap
            .as_ref()
            .map(|(price, volume)| calculate_vwap(table, price, volume))
            .filter(|v| v.is_finite());
        let latest_composite = latest_value(&current, self.composite.output());

        debug!(
            instrument = table.instrument(),
            triggers = triggers.len(),
            issues = issues.len(),
            "instrument processed"
        );

        InstrumentReport {
            instrument: table.instrument().to_string(),
            table: current,
            triggers,
            vwap,
            latest_composite,
            issues,
        }
    }
}

/// Record a step's warnings and hand back its table.
fn absorb(step: &dyn TableTransform, outcome: Outcome, issues: &mut Vec<String>) -> TimeSeriesTable {
    issues.extend(
        outcome
            .warnings
            .iter()
            .map(|w| format!("{}: {}", step.name(), w)),
    );
    outcome.table
}

/// Value of `column` on the latest date where it is defined.
fn latest_value(table: &TimeSeriesTable, column: &str) -> Option<f64> {
    let values = table.numeric(column).ok()?.values;
    table
        .dates()
        .iter()
        .zip(values)
        .filter_map(|(date, v)| v.map(|v| (*date, v)))
        .max_by_key(|(date, _)| *date)
        .map(|(_, v)| v)
}
