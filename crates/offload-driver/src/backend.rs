//! Backend abstraction for accelerators
//!
//! Everything the harness needs from a device goes through `Accelerator`.
//! Copies to the device and kernel dispatch may return before the device has
//! finished; `wait()` and `KernelEvent::wait()` are the only ordering points.

use std::fmt::Debug;

use offload_model::Scalar;

use crate::buffer::DeviceBuffer;
use crate::capabilities::DeviceCapabilities;
use crate::error::Result;
use crate::event::KernelEvent;
use crate::kernel::KernelLaunch;

/// Accelerator trait - unified interface for offload backends
pub trait Accelerator: Debug + Send {
    /// Capabilities queried when the backend was created
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Backend type for reporting
    fn backend_type(&self) -> BackendType;

    /// Whether kernel events on this queue carry timestamps
    ///
    /// True only if the queue was created with profiling and the device
    /// supports it.
    fn profiling_enabled(&self) -> bool;

    /// Allocate `len` scalars of device memory
    ///
    /// # Errors
    ///
    /// Returns error if the device is out of memory or gone.
    fn alloc(&mut self, len: usize) -> Result<DeviceBuffer>;

    /// Enqueue a host→device copy of `src` into `dst`
    ///
    /// May return before the copy completes; call `wait()` to be sure. A copy
    /// that fails on the device is reported by the next `wait()`.
    ///
    /// # Errors
    ///
    /// Returns error on length mismatch, if `dst` belongs to another device,
    /// or if the device is gone.
    fn copy_to_device(&mut self, dst: &DeviceBuffer, src: &[Scalar]) -> Result<()>;

    /// Copy `src` from the device into `dst`
    ///
    /// Returns once `dst` holds the data (all earlier queue work included).
    ///
    /// # Errors
    ///
    /// Returns error on length mismatch or if the device is gone.
    fn copy_to_host(&mut self, dst: &mut [Scalar], src: &DeviceBuffer) -> Result<()>;

    /// Enqueue a kernel and return its completion event
    ///
    /// # Errors
    ///
    /// Returns error if the launch is malformed or the device is gone.
    fn dispatch(&mut self, launch: &KernelLaunch<'_>) -> Result<KernelEvent>;

    /// Block until every queued copy and kernel has finished
    ///
    /// # Errors
    ///
    /// Returns the first copy or kernel failure since the previous wait, or
    /// `DeviceLost` if the device is gone.
    fn wait(&mut self) -> Result<()>;
}

/// Backend type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Software device: host thread with private memory
    Software,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Software => write!(f, "Software (host-emulated device)"),
        }
    }
}

/// Backend selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSelection {
    /// Best available backend
    Auto,

    /// Force the software device
    Software,
}

/// Queue properties requested at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueOptions {
    /// Record start/end timestamps for every kernel
    pub enable_profiling: bool,
}

impl QueueOptions {
    /// Queue that records kernel timestamps
    pub const fn profiling() -> Self {
        Self {
            enable_profiling: true,
        }
    }

    /// Queue without timestamps
    pub const fn plain() -> Self {
        Self {
            enable_profiling: false,
        }
    }
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self::profiling()
    }
}

/// Select and create a backend
///
/// # Errors
///
/// Returns error if the selected backend cannot be initialized.
pub fn select_backend(selection: BackendSelection, options: QueueOptions) -> Result<Box<dyn Accelerator>> {
    use crate::backends::software::{SoftwareBackend, SoftwareConfig};

    match selection {
        BackendSelection::Auto => {
            tracing::info!("No hardware backend compiled in, using software device");
            SoftwareBackend::new(SoftwareConfig::default(), options)
                .map(|b| Box::new(b) as Box<dyn Accelerator>)
        }

        BackendSelection::Software => SoftwareBackend::new(SoftwareConfig::default(), options)
            .map(|b| Box::new(b) as Box<dyn Accelerator>),
    }
}
