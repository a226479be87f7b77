//! Per-iteration phase timings and their reduction.
//!
//! The table is sized up front (one slot per iteration and phase), so the
//! spread is reported as the **population** standard deviation. A single
//! recorded value has a standard deviation of 0.

use std::fmt;

use crate::error::{BenchError, Result};

/// The three timed phases of a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Host→device copies (and record packing)
    TransferIn,
    /// Kernel execution
    Compute,
    /// Device→host copies (and record unpacking)
    TransferOut,
}

impl Phase {
    /// All phases in trial order
    pub const ALL: [Phase; 3] = [Phase::TransferIn, Phase::Compute, Phase::TransferOut];

    const fn slot(self) -> usize {
        match self {
            Self::TransferIn => 0,
            Self::Compute => 1,
            Self::TransferOut => 2,
        }
    }

    /// Report heading
    pub const fn label(self) -> &'static str {
        match self {
            Self::TransferIn => "copy host to device",
            Self::Compute => "device compute time",
            Self::TransferOut => "copy device to host",
        }
    }
}

/// Durations of one trial, microseconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrialRecord {
    /// Host→device phase
    pub transfer_in_us: f64,
    /// Compute phase
    pub compute_us: f64,
    /// Device→host phase
    pub transfer_out_us: f64,
}

impl TrialRecord {
    /// Duration of `phase`
    pub const fn get(&self, phase: Phase) -> f64 {
        match phase {
            Phase::TransferIn => self.transfer_in_us,
            Phase::Compute => self.compute_us,
            Phase::TransferOut => self.transfer_out_us,
        }
    }

    /// Sum of the three phases
    pub fn total_us(&self) -> f64 {
        self.transfer_in_us + self.compute_us + self.transfer_out_us
    }
}

/// Reduction of one phase over all recorded iterations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseStats {
    /// Values reduced
    pub count: usize,
    /// Σ
    pub sum: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl PhaseStats {
    /// Reduce `values`; empty input gives all zeros.
    ///
    /// Values are sorted before summing so the result does not depend on the
    /// order they were recorded in. The mean is accumulated as an offset from
    /// the minimum, which keeps it exact when every value is equal.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len() as f64;
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let sum: f64 = sorted.iter().sum();
        let mean = min + sorted.iter().map(|v| v - min).sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Self {
            count: sorted.len(),
            sum,
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

impl fmt::Display for PhaseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Average execution time: (mean ± σ)   {:.1} µs ± {:.1} µs",
            self.mean, self.std_dev
        )?;
        write!(f, "                        (min … max)  {:.1} µs … {:.1} µs", self.min, self.max)
    }
}

/// Fixed-size table of phase durations, one row per iteration
#[derive(Debug, Clone, PartialEq)]
pub struct TimingAggregator {
    table: [Vec<Option<f64>>; 3],
}

impl TimingAggregator {
    /// Table for `iterations` trials
    pub fn new(iterations: usize) -> Self {
        Self {
            table: [vec![None; iterations], vec![None; iterations], vec![None; iterations]],
        }
    }

    /// Rows in the table
    pub fn capacity(&self) -> usize {
        self.table[0].len()
    }

    /// Record one value; a second write to the same cell overwrites.
    ///
    /// # Errors
    ///
    /// Returns error if `iteration` is outside the table.
    pub fn record(&mut self, iteration: usize, phase: Phase, duration_us: f64) -> Result<()> {
        let capacity = self.capacity();
        let cell = self.table[phase.slot()]
            .get_mut(iteration)
            .ok_or(BenchError::IterationOutOfRange { iteration, capacity })?;
        *cell = Some(duration_us.max(0.0));
        Ok(())
    }

    /// Record all three phases of one trial
    ///
    /// # Errors
    ///
    /// Returns error if `iteration` is outside the table.
    pub fn record_trial(&mut self, iteration: usize, trial: &TrialRecord) -> Result<()> {
        for phase in Phase::ALL {
            self.record(iteration, phase, trial.get(phase))?;
        }
        Ok(())
    }

    /// Recorded values of `phase`, in iteration order
    pub fn values(&self, phase: Phase) -> Vec<f64> {
        self.table[phase.slot()].iter().flatten().copied().collect()
    }

    /// Statistics of `phase` over every recorded iteration
    pub fn stats(&self, phase: Phase) -> PhaseStats {
        PhaseStats::from_values(&self.values(phase))
    }

    /// Recorded trial at `iteration`, if all three phases are present
    pub fn trial(&self, iteration: usize) -> Option<TrialRecord> {
        let get = |phase: Phase| self.table[phase.slot()].get(iteration).copied().flatten();
        Some(TrialRecord {
            transfer_in_us: get(Phase::TransferIn)?,
            compute_us: get(Phase::Compute)?,
            transfer_out_us: get(Phase::TransferOut)?,
        })
    }
}
