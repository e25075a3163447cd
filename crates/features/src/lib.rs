//! Statistical signal detection for the footprint scanner.
//!
//! This crate handles:
//! - Rolling baselines (median, mean, standard deviation) and Z-scores
//! - Composite anomaly scores fused from several Z-scores
//! - Consecutive and scattered threshold-breach pattern detection
//! - Bounded, gap-safe percentage-change enrichment
//! - The per-instrument pipeline chaining the steps above

pub mod baseline;
pub mod change;
pub mod composite;
pub mod pattern;
pub mod pipeline;
pub mod rolling;
pub mod transform;

pub use baseline::BaselineComputer;
pub use change::{sanitized_change, ChangeSanitizer};
pub use composite::{composite_score, CompositeScorer};
pub use pattern::PatternDetector;
pub use pipeline::{FeaturePipeline, InstrumentReport};
pub use rolling::RollingWindow;
pub use transform::{Outcome, TableTransform};
