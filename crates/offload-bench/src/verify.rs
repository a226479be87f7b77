//! Post-run result check at a handful of sample indices.
//!
//! Every variant must reproduce `streams · input[j] + streams(streams+1)/2`.
//! Loads are observed through `result[j]`; stores through the sum of the
//! written streams at `j`. A mismatch is reported, never raised.

use std::fmt;

use offload_model::pattern::{expected, sample_indices};
use offload_model::{Direction, Scalar, Variant};

use crate::streams::HostStreams;

/// Outcome at one sampled index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Check {
    /// Element index
    pub index: usize,
    /// Value read back from the host mirrors
    pub observed: Scalar,
    /// Closed-form expectation
    pub expected: Scalar,
    /// `|observed − expected| < tolerance`
    pub passed: bool,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] res: {} == {} {}",
            self.index,
            self.observed,
            self.expected,
            if self.passed { "OK" } else { "FAIL" }
        )
    }
}

/// All sampled checks of one run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VerificationReport {
    /// Checks in index order
    pub checks: Vec<Check>,
}

impl VerificationReport {
    /// True if every sampled index matched
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Number of matching indices
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }
}

/// Check `host` after the final trial of `variant`.
pub fn verify(variant: Variant, host: &HostStreams, tolerance: Scalar) -> VerificationReport {
    let streams = variant.stream_count();
    let checks = sample_indices(host.input.len())
        .into_iter()
        .map(|index| {
            let observed = match variant.direction() {
                Direction::Load => host.result[index],
                Direction::Store => host.streams.iter().map(|s| s[index]).sum(),
            };
            let expected = expected(streams, host.input[index]);
            Check {
                index,
                observed,
                expected,
                passed: (observed - expected).abs() < tolerance,
            }
        })
        .collect();

    VerificationReport { checks }
}
