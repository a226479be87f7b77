//! Accelerator seam for the streaming offload benchmarks.
//!
//! The harness never talks to a device directly. It holds a
//! `Box<dyn Accelerator>` and uses four things from it: buffer allocation,
//! host↔device copies, kernel dispatch returning an event, and a queue wait.
//!
//! # Backends
//!
//! ```text
//! SoftwareBackend: device thread with its own memory and an in-order queue;
//!                   kernel events carry start/end timestamps when the queue
//!                   was created with profiling enabled
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use offload_driver::{select_backend, BackendSelection, KernelLaunch, QueueOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut dev = select_backend(BackendSelection::Auto, QueueOptions::profiling())?;
//! let a = dev.alloc(1024)?;
//! let b = dev.alloc(1024)?;
//! let res = dev.alloc(1024)?;
//! dev.copy_to_device(&a, &vec![1.0; 1024])?;
//! dev.copy_to_device(&b, &vec![2.0; 1024])?;
//! dev.wait()?;
//!
//! let mut event = dev.dispatch(&KernelLaunch::load(vec![&a, &b], &res))?;
//! let ts = event.profiling_info()?;
//! println!("kernel: {:.1} µs", ts.duration_us());
//!
//! let mut out = vec![0.0; 1024];
//! dev.copy_to_host(&mut out, &res)?;
//! assert_eq!(out[0], 3.0);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod backend;
pub mod backends;
mod buffer;
mod capabilities;
mod error;
mod event;
pub mod kernel;

pub use backend::{select_backend, Accelerator, BackendSelection, BackendType, QueueOptions};
pub use backends::software::{SoftwareBackend, SoftwareConfig};
pub use buffer::{BufferId, DeviceBuffer};
pub use capabilities::DeviceCapabilities;
pub use error::{OffloadError, Result};
pub use event::{EventTimestamps, KernelEvent};
pub use kernel::KernelLaunch;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        select_backend, Accelerator, BackendSelection, DeviceBuffer, DeviceCapabilities,
        EventTimestamps, KernelEvent, KernelLaunch, OffloadError, QueueOptions, Result,
        SoftwareBackend,
    };
}
