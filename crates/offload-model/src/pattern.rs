//! Deterministic seed pattern and the values the device must produce.
//!
//! ```text
//! input[i]    = i
//! stream_k[i] = i + k          k = 1..=streams
//! result[i]   = 0
//! ```
//!
//! Both kernel families end up with the same closed form at every index:
//! `streams * input[i] + (1 + 2 + … + streams)`.

use crate::defaults::Scalar;

/// Seed value of the input stream at `index`.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn input_value(index: usize) -> Scalar {
    index as Scalar
}

/// Seed value of secondary stream `k` (1-based) at `index`.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn stream_value(k: usize, index: usize) -> Scalar {
    index as Scalar + k as Scalar
}

/// `1 + 2 + … + streams`.
#[must_use]
pub const fn triangular(streams: usize) -> usize {
    streams * (streams + 1) / 2
}

/// Expected observation for `streams` streams at an element whose input is `input`.
///
/// For loads this is `result[j]`; for stores it is `Σ stream_k[j]`.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn expected(streams: usize, input: Scalar) -> Scalar {
    streams as Scalar * input + triangular(streams) as Scalar
}

/// Indices checked after the last trial: first three, middle three, last.
///
/// Out-of-range and repeated indices are dropped, so short streams still get
/// a valid (smaller) sample.
#[must_use]
pub fn sample_indices(items: usize) -> Vec<usize> {
    if items == 0 {
        return Vec::new();
    }
    let mid = items / 2;
    let candidates = [
        Some(0),
        Some(1),
        Some(2),
        mid.checked_sub(1),
        Some(mid),
        Some(mid + 1),
        Some(items - 1),
    ];
    let mut out: Vec<usize> = Vec::with_capacity(candidates.len());
    for j in candidates.into_iter().flatten() {
        if j < items && !out.contains(&j) {
            out.push(j);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangular_numbers() {
        assert_eq!(triangular(4), 10);
        assert_eq!(triangular(5), 15);
        assert_eq!(triangular(8), 36);
    }

    #[test]
    fn four_load_closed_form() {
        // 4*i + 10 for i in 0..8
        let got: Vec<Scalar> = (0..8).map(|i| expected(4, input_value(i))).collect();
        assert_eq!(got, vec![10.0, 14.0, 18.0, 22.0, 26.0, 30.0, 34.0, 38.0]);
    }

    #[test]
    fn seed_sum_matches_closed_form() {
        for streams in [4, 5, 8] {
            for i in [0usize, 7, 1_000_003] {
                let sum: Scalar = (1..=streams).map(|k| stream_value(k, i)).sum();
                assert!((sum - expected(streams, input_value(i))).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn sample_indices_large() {
        assert_eq!(sample_indices(10_000_000), vec![0, 1, 2, 4_999_999, 5_000_000, 5_000_001, 9_999_999]);
    }

    #[test]
    fn sample_indices_small() {
        assert_eq!(sample_indices(0), Vec::<usize>::new());
        assert_eq!(sample_indices(1), vec![0]);
        assert_eq!(sample_indices(4), vec![0, 1, 2, 3]);
        assert_eq!(sample_indices(8), vec![0, 1, 2, 3, 4, 5, 7]);
    }
}
