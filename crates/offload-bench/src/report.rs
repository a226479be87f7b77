//! Run summary and its console rendering.

use std::fmt;
use std::time::Duration;

use offload_model::defaults::SCALAR_BYTES;
use offload_model::Variant;

use crate::timing::{Phase, PhaseStats, TimingAggregator, TrialRecord};
use crate::verify::VerificationReport;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Variant that ran
    pub variant: Variant,
    /// Elements per stream
    pub items: usize,
    /// Trials completed
    pub iterations: usize,
    /// How the compute phase was timed
    pub compute_timer: &'static str,
    /// Per-iteration phase durations
    pub timings: TimingAggregator,
    /// Sampled result check after the last trial
    pub verification: VerificationReport,
    /// Wall time of the whole trial loop
    pub total: Duration,
}

impl RunReport {
    /// Statistics of one phase
    pub fn stats(&self, phase: Phase) -> PhaseStats {
        self.timings.stats(phase)
    }

    /// Loop time divided by the number of trials, milliseconds
    #[allow(clippy::cast_precision_loss)]
    pub fn per_iteration_ms(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.total.as_secs_f64() * 1e3 / self.iterations as f64
    }

    /// Bytes moved host→device per trial
    pub const fn bytes_in(&self) -> usize {
        self.variant.streams_in().saturating_mul(self.items).saturating_mul(SCALAR_BYTES)
    }

    /// Bytes moved device→host per trial
    pub const fn bytes_out(&self) -> usize {
        self.variant.streams_out().saturating_mul(self.items).saturating_mul(SCALAR_BYTES)
    }

    /// Mean host→device bandwidth, MB/s
    pub fn bandwidth_in_mb_s(&self) -> f64 {
        bandwidth_mb_s(self.bytes_in(), self.stats(Phase::TransferIn).mean)
    }

    /// Mean device→host bandwidth, MB/s
    pub fn bandwidth_out_mb_s(&self) -> f64 {
        bandwidth_mb_s(self.bytes_out(), self.stats(Phase::TransferOut).mean)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode: {} (compute timed by {})", self.variant, self.compute_timer)?;
        writeln!(f, "Items: {}", self.items)?;
        writeln!(f)?;
        for check in &self.verification.checks {
            writeln!(f, "{check}")?;
        }
        for phase in Phase::ALL {
            writeln!(f)?;
            writeln!(f, "-- {} --", phase.label())?;
            writeln!(f, "{}", self.stats(phase))?;
        }
        writeln!(f)?;
        writeln!(f, "Simulation execution time: {:.3} s", self.total.as_secs_f64())?;
        write!(f, "Iteration execution time: {:.3} ms", self.per_iteration_ms())
    }
}

/// `bytes` moved in `us` microseconds, in MB/s (2^20 bytes)
#[allow(clippy::cast_precision_loss)]
pub fn bandwidth_mb_s(bytes: usize, us: f64) -> f64 {
    if us <= 0.0 {
        return 0.0;
    }
    (bytes as f64 / 1_048_576.0) / (us / 1e6)
}

/// One progress line: `  compute time: T ms (in ms, compute us, out ms)`
pub fn per_iteration_line(trial: &TrialRecord) -> String {
    format!(
        "  compute time: {:.3} ms ({:.3} ms, {:.1} us, {:.3} ms)",
        trial.total_us() / 1e3,
        trial.transfer_in_us / 1e3,
        trial.compute_us,
        trial.transfer_out_us / 1e3
    )
}
