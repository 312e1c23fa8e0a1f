//! Property-based tests for the streaming statistics and comparison math
//!
//! - Test mathematical invariants of the running aggregates
//! - Test serialization safety of comparison payloads
//! - Run with ProptestConfig::with_cases(100)
//! - Must complete in <30 seconds for pre-commit hook

use ascender::experiment::RunningStats;
use ascender::registry::{MetricDelta, PctChange};
use proptest::prelude::*;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Metric values in a realistic scoring range
fn arb_metric() -> impl Strategy<Value = f64> {
    -1000.0f64..1000.0
}

/// Nonzero baseline values (pct change is defined only off zero)
fn arb_nonzero_baseline() -> impl Strategy<Value = f64> {
    (0.001f64..1000.0).prop_flat_map(|v| prop_oneof![Just(v), Just(-v)])
}

/// Batch sizes for batched observation
fn arb_batch() -> impl Strategy<Value = u64> {
    1u64..200
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Running Statistics Properties
    // ========================================================================

    /// Property: one batched observation equals that many single observations
    #[test]
    fn prop_batched_equals_sequential(value in arb_metric(), n in arb_batch()) {
        let mut batched = RunningStats::new();
        batched.observe(value, n);

        let mut sequential = RunningStats::new();
        for _ in 0..n {
            sequential.observe(value, 1);
        }

        prop_assert_eq!(batched.count, sequential.count);
        prop_assert!((batched.sum - sequential.sum).abs() < 1e-6);
        prop_assert!((batched.sum_of_squares - sequential.sum_of_squares).abs() < 1e-3);
    }

    /// Property: standard deviation is never negative or NaN
    #[test]
    fn prop_std_dev_non_negative(
        values in proptest::collection::vec(arb_metric(), 1..50)
    ) {
        let mut stats = RunningStats::new();
        for value in &values {
            stats.observe(*value, 1);
        }

        let summary = stats.summary().unwrap();
        prop_assert!(summary.std_dev >= 0.0);
        prop_assert!(!summary.std_dev.is_nan());
        prop_assert!(!summary.mean.is_nan());
    }

    /// Property: the mean stays within the observed value range
    #[test]
    fn prop_mean_within_observed_range(
        values in proptest::collection::vec(arb_metric(), 1..50)
    ) {
        let mut stats = RunningStats::new();
        for value in &values {
            stats.observe(*value, 1);
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = stats.summary().unwrap().mean;
        prop_assert!(mean >= min - 1e-9);
        prop_assert!(mean <= max + 1e-9);
    }

    /// Property: identical observations have zero spread
    #[test]
    fn prop_constant_samples_zero_std_dev(value in arb_metric(), n in arb_batch()) {
        let mut stats = RunningStats::new();
        stats.observe(value, n);

        let summary = stats.summary().unwrap();
        prop_assert!((summary.mean - value).abs() < 1e-9);
        prop_assert!(summary.std_dev.abs() < 1e-3);
    }

    // ========================================================================
    // Percentage Change Properties
    // ========================================================================

    /// Property: pct change is never an IEEE infinity or NaN
    #[test]
    fn prop_pct_change_always_finite(baseline in arb_metric(), value in arb_metric()) {
        match PctChange::compute(baseline, value) {
            PctChange::Defined(pct) => prop_assert!(pct.is_finite()),
            PctChange::Undefined => prop_assert!(baseline == 0.0),
        }
    }

    /// Property: pct change round-trips through JSON
    #[test]
    fn prop_pct_change_serializable(baseline in arb_metric(), value in arb_metric()) {
        let pct = PctChange::compute(baseline, value);
        let json = serde_json::to_string(&pct).unwrap();
        prop_assert!(!json.contains("inf"));

        let back: PctChange = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(pct, back);
    }

    /// Property: equal values yield a zero pct change off any nonzero baseline
    #[test]
    fn prop_pct_change_identity(baseline in arb_nonzero_baseline()) {
        let pct = PctChange::compute(baseline, baseline);
        prop_assert!(pct.as_f64().unwrap().abs() < 1e-9);
    }

    /// Property: off a positive baseline, pct change is sign-consistent
    /// with the raw difference
    #[test]
    fn prop_pct_change_sign_matches_diff(
        baseline in 0.001f64..1000.0,
        value in arb_metric()
    ) {
        let pct = PctChange::compute(baseline, value).as_f64().unwrap();
        let diff = value - baseline;
        if diff > 1e-9 {
            prop_assert!(pct > 0.0);
        } else if diff < -1e-9 {
            prop_assert!(pct < 0.0);
        }
    }

    // ========================================================================
    // Metric Delta Properties
    // ========================================================================

    /// Property: diff is exactly the raw difference
    #[test]
    fn prop_metric_delta_diff(value_1 in arb_metric(), value_2 in arb_metric()) {
        let delta = MetricDelta::new(value_1, value_2);
        prop_assert!((delta.diff - (value_2 - value_1)).abs() < 1e-9);
    }

    /// Property: delta payloads always survive a JSON round trip
    #[test]
    fn prop_metric_delta_serializable(value_1 in arb_metric(), value_2 in arb_metric()) {
        let delta = MetricDelta::new(value_1, value_2);
        let json = serde_json::to_string(&delta).unwrap();
        let back: MetricDelta = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(delta, back);
    }
}
