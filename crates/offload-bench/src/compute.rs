//! Compute stage and how it is timed.
//!
//! The trial loop does not care where a compute duration comes from. A
//! `PhaseTimer` dispatches the kernel, waits for it and returns microseconds:
//!
//! - `WallClock` brackets dispatch + completion with host `Instant`s
//! - `DeviceEvent` reads `end − start` from the kernel event's timestamps
//!
//! `DeviceEvent` degrades to the wall clock (with one warning) when the queue
//! cannot provide timestamps, so a missing profiling capability never aborts
//! a run.

use std::time::Instant;

use offload_driver::{Accelerator, KernelLaunch, OffloadError};
use offload_model::{TimingMode, Variant};
use tracing::{debug, warn};

use crate::error::Result;

/// Strategy for measuring the compute phase
pub trait PhaseTimer: Send {
    /// Dispatch `launch`, wait for completion and return its duration in µs.
    ///
    /// # Errors
    ///
    /// Returns error if dispatch fails or the device is lost.
    fn time_compute(&mut self, dev: &mut dyn Accelerator, launch: &KernelLaunch<'_>) -> Result<f64>;

    /// Short label for reports
    fn label(&self) -> &'static str;
}

/// Host wall-clock timing around dispatch and completion
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl PhaseTimer for WallClock {
    fn time_compute(&mut self, dev: &mut dyn Accelerator, launch: &KernelLaunch<'_>) -> Result<f64> {
        let t0 = Instant::now();
        let mut event = dev.dispatch(launch)?;
        event.wait()?;
        dev.wait()?;
        Ok(t0.elapsed().as_secs_f64() * 1e6)
    }

    fn label(&self) -> &'static str {
        "wall clock"
    }
}

/// Device timestamps from the kernel event
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceEvent {
    fell_back: bool,
}

impl DeviceEvent {
    /// Whether any measurement had to use the wall clock
    pub const fn fell_back(&self) -> bool {
        self.fell_back
    }
}

impl PhaseTimer for DeviceEvent {
    fn time_compute(&mut self, dev: &mut dyn Accelerator, launch: &KernelLaunch<'_>) -> Result<f64> {
        let t0 = Instant::now();
        let mut event = dev.dispatch(launch)?;
        event.wait()?;
        let wall_us = t0.elapsed().as_secs_f64() * 1e6;

        match event.profiling_info() {
            Ok(ts) => {
                debug!(
                    "{}: queued {} ns, ran {} ns",
                    event.kernel(),
                    ts.queued_ns(),
                    ts.duration_ns()
                );
                Ok(ts.duration_us())
            }
            Err(OffloadError::ProfilingUnavailable { kernel }) => {
                if !self.fell_back {
                    warn!("No device timestamps for '{kernel}', timing compute with the wall clock");
                    self.fell_back = true;
                }
                Ok(wall_us)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn label(&self) -> &'static str {
        "device event"
    }
}

/// Timer matching the variant's timing mode
pub fn timer_for(variant: Variant) -> Box<dyn PhaseTimer> {
    match variant.timing() {
        TimingMode::External => Box::new(WallClock),
        TimingMode::DeviceEvent => Box::new(DeviceEvent::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_driver::{QueueOptions, SoftwareBackend, SoftwareConfig};

    use crate::streams::StreamBundle;
    use crate::transfer;

    #[test]
    fn timer_follows_variant() {
        let plain: Variant = "8loads".parse().unwrap();
        let profiled: Variant = "8loads_profiling".parse().unwrap();
        assert_eq!(timer_for(plain).label(), "wall clock");
        assert_eq!(timer_for(profiled).label(), "device event");
    }

    #[test]
    fn device_event_reads_timestamps() {
        let mut d = SoftwareBackend::new(SoftwareConfig::default(), QueueOptions::profiling()).unwrap();
        let mut b = StreamBundle::allocate("8stores_profiling".parse().unwrap(), 64, &mut d).unwrap();
        transfer::to_device(&mut d, &mut b).unwrap();

        let mut timer = DeviceEvent::default();
        let us = timer.time_compute(&mut d, &b.launch()).unwrap();
        assert!(us >= 0.0);
        assert!(!timer.fell_back());
    }

    #[test]
    fn device_event_falls_back_without_profiling() {
        let mut d = SoftwareBackend::new(SoftwareConfig::default(), QueueOptions::plain()).unwrap();
        let mut b = StreamBundle::allocate("8loads_profiling".parse().unwrap(), 16, &mut d).unwrap();
        transfer::to_device(&mut d, &mut b).unwrap();

        let mut timer = DeviceEvent::default();
        let us = timer.time_compute(&mut d, &b.launch()).unwrap();
        assert!(us >= 0.0);
        assert!(timer.fell_back());
    }

    #[test]
    fn wall_clock_completes_kernel() {
        let mut d = SoftwareBackend::new(SoftwareConfig::default(), QueueOptions::plain()).unwrap();
        let mut b = StreamBundle::allocate("4loads".parse().unwrap(), 8, &mut d).unwrap();
        transfer::to_device(&mut d, &mut b).unwrap();
        WallClock.time_compute(&mut d, &b.launch()).unwrap();
        transfer::to_host(&mut d, &mut b).unwrap();
        // 4·7 + 10
        assert_eq!(b.host().result[7], 38.0);
    }
}
