// SPDX-License-Identifier: AGPL-3.0-only

//! Variant sweep: every benchmark variant at one size, one line each.
//!
//! Reports mean transfer-in, compute and transfer-out times, the effective
//! host↔device bandwidth of each copy direction and how many sampled indices
//! verified.
//!
//! Usage:
//!   cargo run --bin bench_sweep
//!   cargo run --bin bench_sweep -- --items 4000000 --iterations 20

use anyhow::Result;
use offload_bench::{run, HarnessConfig, Phase};
use offload_driver::{select_backend, BackendSelection, QueueOptions};
use offload_model::Variant;
use tracing_subscriber::EnvFilter;

const DEFAULT_ITEMS: usize = 1_000_000;
const DEFAULT_ITERATIONS: usize = 10;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let items = parse_arg(&args, "--items", DEFAULT_ITEMS);
    let iterations = parse_arg(&args, "--iterations", DEFAULT_ITERATIONS);

    let mut dev = select_backend(BackendSelection::Auto, QueueOptions::profiling())?;

    println!("Streaming variant sweep");
    println!("=======================");
    println!("Device     : {}", dev.capabilities());
    println!("Items      : {items}");
    println!("Iterations : {iterations}");
    println!();
    println!(
        "  {:<18} {:>10} {:>12} {:>10} {:>11} {:>11}  verified",
        "variant", "in ms", "compute µs", "out ms", "in MB/s", "out MB/s"
    );

    let mut failures = 0usize;
    for variant in Variant::all() {
        let config = HarnessConfig::new(*variant)
            .with_items(items)
            .with_iterations(iterations);
        let report = run(&config, dev.as_mut())?;

        let v = &report.verification;
        if !v.all_passed() {
            failures += 1;
        }
        println!(
            "  {:<18} {:>10.3} {:>12.1} {:>10.3} {:>11.1} {:>11.1}  {}/{}",
            variant.name(),
            report.stats(Phase::TransferIn).mean / 1e3,
            report.stats(Phase::Compute).mean,
            report.stats(Phase::TransferOut).mean / 1e3,
            report.bandwidth_in_mb_s(),
            report.bandwidth_out_mb_s(),
            v.passed_count(),
            v.checks.len()
        );
    }

    println!();
    if failures == 0 {
        println!("All variants verified.");
    } else {
        println!("{failures} variant(s) FAILED verification.");
    }

    Ok(())
}

fn parse_arg(args: &[String], flag: &str, default: usize) -> usize {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
