//! Experiment Tracking and Promotion
//!
//! Two-arm online comparisons between registered model versions:
//!
//! ```text
//! ExperimentRecord ──< ArmStats (A, B)
//!                          │
//!                          └──< RunningStats (per metric, streaming)
//! ```
//!
//! Samples stream in from the serving layer via [`ExperimentEngine::record`];
//! an explicit [`ExperimentEngine::end`] freezes the statistics, compares the
//! arms, and declares a winner on the primary decision metric — the FIRST
//! entry of `tracked_metrics`. The metric list order is load-bearing.
//! [`PromotionController::promote`] then applies the winner as the model
//! type's active version.

mod engine;
mod promote;
mod record;
mod stats;

pub use engine::{ExperimentEngine, ExperimentResults};
pub use promote::PromotionController;
pub use record::{
    Arm, ArmStats, ExperimentRecord, ExperimentStatus, FinalResult, MetricComparison, Winner,
};
pub use stats::{MetricSummary, RunningStats};
