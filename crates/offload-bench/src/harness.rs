//! The trial loop.
//!
//! ```text
//! validate config → allocate StreamBundle
//! for each iteration:
//!     transfer in   (wall clock)
//!     compute       (PhaseTimer chosen by the variant)
//!     transfer out  (wall clock)
//!     record trial
//! verify sampled indices → RunReport
//! ```
//!
//! Phases never overlap: every stage waits on the queue before returning.

use std::time::Instant;

use offload_driver::Accelerator;
use tracing::{debug, info, warn};

use crate::compute::timer_for;
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::report::RunReport;
use crate::streams::StreamBundle;
use crate::timing::{TimingAggregator, TrialRecord};
use crate::transfer;
use crate::verify::verify;

/// Run `config` on `dev` and summarise it.
///
/// # Errors
///
/// Returns error if the configuration is invalid or any device operation
/// fails. Verification mismatches are reported, not returned.
pub fn run(config: &HarnessConfig, dev: &mut dyn Accelerator) -> Result<RunReport> {
    run_with(config, dev, |_, _| {})
}

/// Like [`run`], calling `on_trial` after every completed trial.
///
/// # Errors
///
/// Returns error if the configuration is invalid or any device operation
/// fails.
pub fn run_with<F>(config: &HarnessConfig, dev: &mut dyn Accelerator, mut on_trial: F) -> Result<RunReport>
where
    F: FnMut(usize, &TrialRecord),
{
    config.validate()?;
    let variant = config.variant;

    if variant.is_profiling() && !dev.profiling_enabled() {
        warn!("{variant} wants device timestamps but the queue has no profiling; compute falls back to wall clock");
    }

    let mut bundle = StreamBundle::allocate(variant, config.items, dev)?;
    let mut timer = timer_for(variant);
    let mut timings = TimingAggregator::new(config.iterations);

    info!(
        "Running {variant}: {} items × {} iterations, compute timed by {}",
        config.items,
        config.iterations,
        timer.label()
    );

    let loop_start = Instant::now();
    for iteration in 0..config.iterations {
        let t0 = Instant::now();
        transfer::to_device(dev, &mut bundle)?;
        let transfer_in_us = t0.elapsed().as_secs_f64() * 1e6;

        let compute_us = timer.time_compute(dev, &bundle.launch())?;

        let t0 = Instant::now();
        transfer::to_host(dev, &mut bundle)?;
        let transfer_out_us = t0.elapsed().as_secs_f64() * 1e6;

        let trial = TrialRecord {
            transfer_in_us,
            compute_us,
            transfer_out_us,
        };
        timings.record_trial(iteration, &trial)?;
        debug!("iteration {iteration}: {trial:?}");
        on_trial(iteration, &trial);
    }
    let total = loop_start.elapsed();

    let verification = verify(variant, bundle.host(), config.tolerance);
    if !verification.all_passed() {
        warn!(
            "{variant}: {}/{} sampled indices match",
            verification.passed_count(),
            verification.checks.len()
        );
    }

    Ok(RunReport {
        variant,
        items: config.items,
        iterations: config.iterations,
        compute_timer: timer.label(),
        timings,
        verification,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_driver::{QueueOptions, SoftwareBackend, SoftwareConfig};

    use crate::error::BenchError;
    use crate::timing::Phase;

    fn dev() -> SoftwareBackend {
        SoftwareBackend::new(SoftwareConfig::default(), QueueOptions::plain()).unwrap()
    }

    #[test]
    fn callback_sees_every_trial() {
        let mut d = dev();
        let config = HarnessConfig::for_variant("5loads").unwrap().with_items(32).with_iterations(4);
        let mut seen = Vec::new();
        let report = run_with(&config, &mut d, |i, _| seen.push(i)).unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(report.stats(Phase::Compute).count, 4);
        assert!(report.verification.all_passed());
    }

    #[test]
    fn invalid_config_allocates_nothing() {
        let mut d = dev();
        let config = HarnessConfig::for_variant("4loads").unwrap().with_items(0);
        assert!(matches!(run(&config, &mut d), Err(BenchError::Config { .. })));
        assert_eq!(d.allocated_bytes(), 0);
    }

    #[test]
    fn device_memory_released_after_run() {
        let mut d = dev();
        let config = HarnessConfig::for_variant("8stores").unwrap().with_items(64).with_iterations(2);
        run(&config, &mut d).unwrap();
        assert_eq!(d.allocated_bytes(), 0);
    }

    #[test]
    fn out_of_memory_is_fatal() {
        let mut d = SoftwareBackend::new(SoftwareConfig::default().with_memory(1024), QueueOptions::plain()).unwrap();
        let config = HarnessConfig::for_variant("8loads").unwrap().with_items(1024).with_iterations(1);
        assert!(matches!(run(&config, &mut d), Err(BenchError::Backend { .. })));
    }
}
