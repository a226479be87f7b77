//! `offload`: streaming host↔accelerator benchmarks from the command line.
//!
//! ```text
//! USAGE:
//!   offload devices                                 Backend identification and capabilities
//!   offload variants                                List benchmark variants
//!   offload run --variant <NAME> [N] [--iterations I] [--no-profiling-queue]
//! ```
//!
//! `N` is the element count per stream (default 10,000,000). A value that is
//! not a number falls back to the default.

use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use offload_bench::{per_iteration_line, run_with, HarnessConfig};
use offload_driver::{select_backend, Accelerator, BackendSelection, QueueOptions};
use offload_model::defaults::{DEFAULT_ITEMS, DEFAULT_ITERATIONS};
use offload_model::{Direction, Layout, TimingMode, Variant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "offload", about = "Streaming host↔accelerator benchmarks", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the selected backend and its capabilities.
    Devices {
        /// Create the queue without kernel timestamps.
        #[arg(long)]
        no_profiling_queue: bool,
    },
    /// List every benchmark variant.
    Variants,
    /// Run one benchmark variant.
    Run {
        /// Variant name (see `offload variants`).
        #[arg(long, value_parser = parse_variant)]
        variant: Variant,
        /// Elements per stream; non-numeric input uses the default.
        items: Option<String>,
        /// Trials to run.
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,
        /// Create the queue without kernel timestamps.
        #[arg(long)]
        no_profiling_queue: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Devices { no_profiling_queue } => cmd_devices(queue_options(no_profiling_queue))?,
        Cmd::Variants => cmd_variants(),
        Cmd::Run {
            variant,
            items,
            iterations,
            no_profiling_queue,
        } => {
            let config = HarnessConfig::new(variant)
                .with_items(parse_items(items.as_deref()))
                .with_iterations(iterations);
            cmd_run(&config, queue_options(no_profiling_queue))?;
        }
    }

    Ok(())
}

fn cmd_devices(options: QueueOptions) -> Result<()> {
    let (dev, _) = open_device(options)?;
    let c = dev.capabilities();
    println!("Backend      : {}", dev.backend_type());
    println!("Device       : {}", c.name);
    println!("Vendor       : {}", c.vendor);
    println!("Compute units: {}", c.max_compute_units);
    println!("Work-group   : ≤ {}", c.max_work_group_size);
    println!("Memory       : {} MB", c.global_mem_mb());
    println!(
        "Profiling    : {} (queue {})",
        if c.profiling_supported { "supported" } else { "unsupported" },
        if dev.profiling_enabled() { "on" } else { "off" }
    );
    Ok(())
}

fn cmd_variants() {
    println!("Variants: {}", Variant::all().len());
    println!();
    for v in Variant::all() {
        let direction = match v.direction() {
            Direction::Load => "load ",
            Direction::Store => "store",
        };
        let layout = match v.layout() {
            Layout::Array => "arrays ",
            Layout::Record => "records",
        };
        let timing = match v.timing() {
            TimingMode::External => "wall clock",
            TimingMode::DeviceEvent => "device events",
        };
        println!("  {:<18} {direction} {} streams  {layout}  {timing}", v.name(), v.stream_count());
    }
}

fn cmd_run(config: &HarnessConfig, options: QueueOptions) -> Result<()> {
    config.validate()?;

    let (mut dev, queue_ms) = open_device(options)?;
    let c = dev.capabilities();
    println!("Device: {}", c.name);
    println!(
        "  max work-group size {}, {} compute units, profiling {}",
        c.max_work_group_size,
        c.max_compute_units,
        if c.profiling_supported { "supported" } else { "unsupported" }
    );
    println!("  queue created in {queue_ms:.3} ms");
    println!();

    let report = run_with(config, dev.as_mut(), |_, trial| {
        println!("{}", per_iteration_line(trial));
    })?;

    println!();
    println!("{report}");
    Ok(())
}

fn open_device(options: QueueOptions) -> Result<(Box<dyn Accelerator>, f64)> {
    let t0 = Instant::now();
    let dev = select_backend(BackendSelection::Auto, options)?;
    Ok((dev, t0.elapsed().as_secs_f64() * 1e3))
}

const fn queue_options(no_profiling_queue: bool) -> QueueOptions {
    if no_profiling_queue {
        QueueOptions::plain()
    } else {
        QueueOptions::profiling()
    }
}

fn parse_variant(name: &str) -> Result<Variant, String> {
    name.parse().map_err(|e: offload_model::VariantParseError| e.to_string())
}

/// Element count from the positional argument; anything unparsable is the default.
fn parse_items(arg: Option<&str>) -> usize {
    match arg {
        None => DEFAULT_ITEMS,
        Some(s) => s.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("'{s}' is not an element count, using {DEFAULT_ITEMS}");
            DEFAULT_ITEMS
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_parsing_is_permissive() {
        assert_eq!(parse_items(None), DEFAULT_ITEMS);
        assert_eq!(parse_items(Some("8")), 8);
        assert_eq!(parse_items(Some("lots")), DEFAULT_ITEMS);
        assert_eq!(parse_items(Some("0")), 0);
    }

    #[test]
    fn run_requires_variant() {
        assert!(Cli::try_parse_from(["offload", "run", "1000"]).is_err());
    }

    #[test]
    fn run_rejects_unknown_variant() {
        assert!(Cli::try_parse_from(["offload", "run", "--variant", "3loads"]).is_err());
    }

    #[test]
    fn run_arguments() {
        let cli = Cli::try_parse_from([
            "offload",
            "run",
            "--variant",
            "8loads_profiling",
            "4096",
            "--iterations",
            "5",
            "--no-profiling-queue",
        ])
        .unwrap();
        match cli.command {
            Cmd::Run {
                variant,
                items,
                iterations,
                no_profiling_queue,
            } => {
                assert_eq!(variant.name(), "8loads_profiling");
                assert_eq!(items.as_deref(), Some("4096"));
                assert_eq!(iterations, 5);
                assert!(no_profiling_queue);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn default_queue_profiles() {
        assert!(queue_options(false).enable_profiling);
        assert!(!queue_options(true).enable_profiling);
    }
}
