//! Streaming statistics for experiment arms.
//!
//! The running triple `{count, sum, sum_of_squares}` supports mean and
//! variance without storing raw samples. Naive sums lose precision for very
//! large counts or magnitudes; Welford's online algorithm is the known
//! alternative if that ever bites (tracked as an open improvement).

use serde::{Deserialize, Serialize};

/// Running aggregate for one metric on one arm.
///
/// Batched updates are exactly equivalent to repeated single updates:
/// `observe(v, n)` produces the same triple as `n` calls of `observe(v, 1)`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RunningStats {
    /// Number of samples observed
    pub count: u64,
    /// Sum of observed values
    pub sum: f64,
    /// Sum of squared observed values
    pub sum_of_squares: f64,
}

impl RunningStats {
    /// Create a zeroed aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in `samples` observations of `value`.
    #[allow(clippy::cast_precision_loss)]
    pub fn observe(&mut self, value: f64, samples: u64) {
        let n = samples as f64;
        self.count += samples;
        self.sum += value * n;
        self.sum_of_squares += value * value * n;
    }

    /// Compute the summary for this aggregate.
    ///
    /// Returns `None` when no samples have been observed. Variance is
    /// clamped at zero to guard floating-point underflow into small
    /// negatives.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> Option<MetricSummary> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let mean = self.sum / n;
        let variance = (self.sum_of_squares / n - mean * mean).max(0.0);
        Some(MetricSummary {
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

/// Final summary of one metric on one arm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricSummary {
    /// Sample mean
    pub mean: f64,
    /// Sample standard deviation (population form, matching the triple)
    pub std_dev: f64,
}
