// SPDX-License-Identifier: AGPL-3.0-only

//! Device-timed vs wall-timed compute: do the two clocks agree?
//!
//! Runs `8loads` / `8loads_profiling` and `8stores` / `8stores_profiling`
//! back to back on a profiling queue and compares the compute means. The
//! device figure excludes dispatch and completion latency, so it should be
//! the smaller one, but the two must stay within one order of magnitude.
//!
//! Usage:
//!   cargo run --bin bench_timing_agreement
//!   cargo run --bin bench_timing_agreement -- --items 8000000 --iterations 50

use anyhow::Result;
use offload_bench::{run, HarnessConfig, Phase};
use offload_driver::{select_backend, BackendSelection, QueueOptions};
use tracing_subscriber::EnvFilter;

const DEFAULT_ITEMS: usize = 1_000_000;
const DEFAULT_ITERATIONS: usize = 20;
const MAX_RATIO: f64 = 10.0;

const PAIRS: [(&str, &str); 2] = [("8loads", "8loads_profiling"), ("8stores", "8stores_profiling")];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let items = parse_arg(&args, "--items", DEFAULT_ITEMS);
    let iterations = parse_arg(&args, "--iterations", DEFAULT_ITERATIONS);

    let mut dev = select_backend(BackendSelection::Auto, QueueOptions::profiling())?;

    println!("Compute timing agreement");
    println!("========================");
    println!("Device     : {}", dev.capabilities());
    println!("Items      : {items}");
    println!("Iterations : {iterations}");
    println!();

    if !dev.profiling_enabled() {
        println!("Queue has no profiling; device-timed runs fall back to the wall clock.");
        println!();
    }

    let mut disagreements = 0usize;
    for (wall_name, device_name) in PAIRS {
        let wall = run(
            &HarnessConfig::for_variant(wall_name)?
                .with_items(items)
                .with_iterations(iterations),
            dev.as_mut(),
        )?;
        let device = run(
            &HarnessConfig::for_variant(device_name)?
                .with_items(items)
                .with_iterations(iterations),
            dev.as_mut(),
        )?;

        let wall_us = wall.stats(Phase::Compute).mean;
        let device_us = device.stats(Phase::Compute).mean;
        let spread = ratio(wall_us, device_us);
        let agrees = spread <= MAX_RATIO;
        if !agrees {
            disagreements += 1;
        }

        println!("  {wall_name:<18} wall   {wall_us:>12.1} µs");
        println!("  {device_name:<18} device {device_us:>12.1} µs");
        println!(
            "  ratio {spread:.2}×  {}",
            if agrees { "OK" } else { "OUTSIDE ONE ORDER OF MAGNITUDE" }
        );
        println!();
    }

    if disagreements == 0 {
        println!("Device and wall-clock compute times agree.");
    } else {
        println!("{disagreements} pair(s) disagree by more than {MAX_RATIO}×.");
    }

    Ok(())
}

/// Larger over smaller; infinite if either side measured nothing.
fn ratio(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if lo <= 0.0 {
        return f64::INFINITY;
    }
    hi / lo
}

fn parse_arg(args: &[String], flag: &str, default: usize) -> usize {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
