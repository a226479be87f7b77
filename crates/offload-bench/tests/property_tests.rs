//! Property-based tests for the timing reduction.
//!
//! Key invariants:
//! - Statistics do not depend on the order iterations were recorded in
//! - Identical durations give σ = 0 and min = max = mean = that duration
//! - The standard deviation is never negative

use offload_bench::{Phase, PhaseStats, TimingAggregator};
use proptest::prelude::*;

fn durations() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..1.0e6, 1..64)
}

proptest! {
    /// Any rotation or reversal of the input yields bit-identical stats.
    #[test]
    fn stats_are_order_independent(values in durations(), shift in 0usize..64) {
        let reference = PhaseStats::from_values(&values);

        let mut rotated = values.clone();
        let len = rotated.len();
        rotated.rotate_left(shift % len);
        prop_assert_eq!(PhaseStats::from_values(&rotated), reference);

        let mut reversed = values;
        reversed.reverse();
        prop_assert_eq!(PhaseStats::from_values(&reversed), reference);
    }

    /// Recording order into the aggregator does not change the result.
    #[test]
    fn aggregator_order_independent(values in durations()) {
        let n = values.len();
        let mut forward = TimingAggregator::new(n);
        let mut backward = TimingAggregator::new(n);
        for (i, v) in values.iter().enumerate() {
            forward.record(i, Phase::Compute, *v).unwrap();
            backward.record(n - 1 - i, Phase::Compute, *v).unwrap();
        }
        prop_assert_eq!(forward.stats(Phase::Compute), backward.stats(Phase::Compute));
    }

    /// Equal durations reduce to zero spread and the value itself.
    #[test]
    fn all_equal_durations(value in 0.0f64..1.0e6, n in 1usize..200) {
        let stats = PhaseStats::from_values(&vec![value; n]);
        prop_assert_eq!(stats.std_dev, 0.0);
        prop_assert_eq!(stats.min, value);
        prop_assert_eq!(stats.max, value);
        prop_assert_eq!(stats.mean, value);
        prop_assert_eq!(stats.count, n);
    }

    /// σ is a real, non-negative number.
    #[test]
    fn std_dev_non_negative(values in durations()) {
        let stats = PhaseStats::from_values(&values);
        prop_assert!(stats.std_dev >= 0.0);
        prop_assert!(stats.std_dev.is_finite());
        prop_assert!(stats.min <= stats.max);
    }
}
