//! Streaming offload benchmark harness.
//!
//! Moves streams of doubles between host and an accelerator, runs a small
//! load or store kernel on them, and reports per-phase timing statistics plus
//! a sampled correctness check.
//!
//! ```text
//! HarnessConfig ──▶ harness::run ──▶ RunReport
//!                       │
//!                       ├─ StreamBundle   (host + device mirrors)
//!                       ├─ transfer       (copy in / copy out, record re-pack)
//!                       ├─ PhaseTimer     (wall clock or device event)
//!                       ├─ TimingAggregator
//!                       └─ verify
//! ```
//!
//! # Example
//!
//! ```no_run
//! use offload_bench::{run, HarnessConfig};
//! use offload_driver::{select_backend, BackendSelection, QueueOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::for_variant("8loads_profiling")?.with_items(1 << 20);
//! let mut dev = select_backend(BackendSelection::Auto, QueueOptions::profiling())?;
//! let report = run(&config, dev.as_mut())?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

pub mod compute;
pub mod config;
pub mod error;
pub mod harness;
pub mod report;
pub mod streams;
pub mod timing;
pub mod transfer;
pub mod verify;

pub use compute::{timer_for, DeviceEvent, PhaseTimer, WallClock};
pub use config::HarnessConfig;
pub use error::{BenchError, Result};
pub use harness::{run, run_with};
pub use report::{bandwidth_mb_s, per_iteration_line, RunReport};
pub use streams::{HostStreams, StreamBundle};
pub use timing::{Phase, PhaseStats, TimingAggregator, TrialRecord};
pub use verify::{verify, Check, VerificationReport};
