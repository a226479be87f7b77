//! Kernel completion events
//!
//! `dispatch` returns as soon as the kernel is queued. The event is the only
//! way to learn that it finished and, on a profiling queue, when it started
//! and ended on the device.

use std::sync::mpsc::{Receiver, TryRecvError};

use crate::error::{OffloadError, Result};

/// Device-side timestamps of one kernel, nanoseconds since queue creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTimestamps {
    /// Kernel handed to the queue
    pub submit_ns: u64,
    /// Kernel started executing
    pub start_ns: u64,
    /// Kernel finished executing
    pub end_ns: u64,
}

impl EventTimestamps {
    /// `end − start` in nanoseconds
    pub const fn duration_ns(&self) -> u64 {
        self.end_ns.saturating_sub(self.start_ns)
    }

    /// `end − start` in microseconds
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_us(&self) -> f64 {
        self.duration_ns() as f64 / 1e3
    }

    /// Time spent queued before the kernel started, nanoseconds
    pub const fn queued_ns(&self) -> u64 {
        self.start_ns.saturating_sub(self.submit_ns)
    }
}

/// What the device reports when a kernel leaves the queue
pub(crate) type Completion = Result<EventTimestamps>;

/// Completion handle for a dispatched kernel
#[derive(Debug)]
pub struct KernelEvent {
    kernel: &'static str,
    profiling: bool,
    done: Option<Receiver<Completion>>,
    outcome: Option<Completion>,
}

impl KernelEvent {
    /// Event completed by whoever holds the matching sender
    pub(crate) fn pending(kernel: &'static str, profiling: bool, done: Receiver<Completion>) -> Self {
        Self {
            kernel,
            profiling,
            done: Some(done),
            outcome: None,
        }
    }

    /// Event that is already complete (test doubles, synchronous backends)
    pub fn completed(kernel: &'static str, timestamps: Option<EventTimestamps>) -> Self {
        Self {
            kernel,
            profiling: timestamps.is_some(),
            done: None,
            outcome: Some(Ok(timestamps.unwrap_or(EventTimestamps {
                submit_ns: 0,
                start_ns: 0,
                end_ns: 0,
            }))),
        }
    }

    /// Kernel name
    pub const fn kernel(&self) -> &'static str {
        self.kernel
    }

    /// Block until the kernel has finished.
    ///
    /// # Errors
    ///
    /// Returns the device's error if the kernel failed, or `DeviceLost` if
    /// the device stopped before completing it.
    pub fn wait(&mut self) -> Result<()> {
        self.finish().map(|_| ())
    }

    /// Non-blocking completion check; a failed kernel counts as complete.
    pub fn is_complete(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        match self.done.as_ref().map(Receiver::try_recv) {
            Some(Ok(outcome)) => {
                self.outcome = Some(outcome);
                self.done = None;
                true
            }
            // a disconnected queue surfaces as DeviceLost from wait()
            Some(Err(TryRecvError::Empty | TryRecvError::Disconnected)) | None => false,
        }
    }

    /// Device timestamps of the kernel; waits for completion first.
    ///
    /// # Errors
    ///
    /// Returns `ProfilingUnavailable` if the queue does not record
    /// timestamps, or the error that [`wait`](Self::wait) would return.
    pub fn profiling_info(&mut self) -> Result<EventTimestamps> {
        let ts = self.finish()?;
        if !self.profiling {
            return Err(OffloadError::ProfilingUnavailable {
                kernel: self.kernel,
            });
        }
        Ok(ts)
    }

    fn finish(&mut self) -> Result<EventTimestamps> {
        if self.outcome.is_none() {
            let outcome = match self.done.take() {
                Some(done) => done.recv().unwrap_or_else(|_| {
                    Err(OffloadError::device_lost(format!(
                        "device stopped before '{}' completed",
                        self.kernel
                    )))
                }),
                None => Err(OffloadError::device_lost(format!("event for '{}' has no queue", self.kernel))),
            };
            self.outcome = Some(outcome);
        }
        match &self.outcome {
            Some(Ok(ts)) => Ok(*ts),
            Some(Err(e)) => Err(e.clone()),
            None => Err(OffloadError::device_lost(format!("event for '{}' has no outcome", self.kernel))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn duration_is_end_minus_start() {
        let ts = EventTimestamps {
            submit_ns: 100,
            start_ns: 1_500,
            end_ns: 4_000,
        };
        assert_eq!(ts.duration_ns(), 2_500);
        assert!((ts.duration_us() - 2.5).abs() < 1e-12);
        assert_eq!(ts.queued_ns(), 1_400);
    }

    #[test]
    fn completed_without_profiling_refuses_timestamps() {
        let mut ev = KernelEvent::completed("k", None);
        assert!(ev.is_complete());
        assert!(matches!(
            ev.profiling_info(),
            Err(OffloadError::ProfilingUnavailable { kernel: "k" })
        ));
    }

    #[test]
    fn pending_event_completes_when_sent() {
        let (tx, rx) = mpsc::channel();
        let mut ev = KernelEvent::pending("k", true, rx);
        assert!(!ev.is_complete());
        tx.send(Ok(EventTimestamps {
            submit_ns: 0,
            start_ns: 10,
            end_ns: 30,
        }))
        .unwrap();
        assert_eq!(ev.profiling_info().unwrap().duration_ns(), 20);
    }

    #[test]
    fn dropped_sender_is_device_lost() {
        let (tx, rx) = mpsc::channel::<Completion>();
        drop(tx);
        let mut ev = KernelEvent::pending("k", true, rx);
        assert!(matches!(ev.wait(), Err(OffloadError::DeviceLost { .. })));
        // the failure sticks
        assert!(matches!(ev.wait(), Err(OffloadError::DeviceLost { .. })));
    }

    #[test]
    fn device_error_is_returned_from_wait_and_profiling() {
        let (tx, rx) = mpsc::channel();
        let mut ev = KernelEvent::pending("load", true, rx);
        tx.send(Err(OffloadError::invalid_launch("load", "buffer 1:4 is not resident on the device")))
            .unwrap();
        assert!(ev.is_complete());
        assert!(matches!(ev.wait(), Err(OffloadError::InvalidLaunch { kernel: "load", .. })));
        assert!(matches!(ev.profiling_info(), Err(OffloadError::InvalidLaunch { .. })));
    }
}
