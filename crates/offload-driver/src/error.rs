//! Error types for accelerator operations

use thiserror::Error;

/// Result type alias for accelerator operations
pub type Result<T> = std::result::Result<T, OffloadError>;

/// Errors that can occur while driving an accelerator
#[derive(Debug, Clone, Error)]
pub enum OffloadError {
    /// Allocation would exceed device memory
    #[error("Out of device memory: requested {requested} bytes, {available} available")]
    OutOfDeviceMemory {
        /// Bytes requested
        requested: usize,
        /// Bytes still free on the device
        available: usize,
    },

    /// Host and device buffers disagree on element count
    #[error("Size mismatch in {operation}: host has {host} elements, device has {device}")]
    SizeMismatch {
        /// Operation that was attempted
        operation: &'static str,
        /// Host-side element count
        host: usize,
        /// Device-side element count
        device: usize,
    },

    /// Data transfer failed
    #[error("Transfer failed: {reason}")]
    TransferFailed {
        /// Reason for failure
        reason: String,
    },

    /// Kernel arguments do not describe a runnable launch
    #[error("Invalid kernel launch '{kernel}': {reason}")]
    InvalidLaunch {
        /// Kernel name
        kernel: &'static str,
        /// Reason for failure
        reason: String,
    },

    /// Event timestamps requested from a queue without profiling
    #[error("Profiling information unavailable for kernel '{kernel}' (queue created without profiling or device lacks support)")]
    ProfilingUnavailable {
        /// Kernel name
        kernel: &'static str,
    },

    /// Device thread is gone; nothing further can be submitted
    #[error("Device lost: {reason}")]
    DeviceLost {
        /// Reason for failure
        reason: String,
    },

    /// Requested backend cannot be created
    #[error("Backend unavailable: {reason}")]
    BackendUnavailable {
        /// Reason for failure
        reason: String,
    },
}

impl OffloadError {
    /// Create a transfer failed error
    pub fn transfer_failed(reason: impl Into<String>) -> Self {
        Self::TransferFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid launch error
    pub fn invalid_launch(kernel: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidLaunch {
            kernel,
            reason: reason.into(),
        }
    }

    /// Create a device lost error
    pub fn device_lost(reason: impl Into<String>) -> Self {
        Self::DeviceLost {
            reason: reason.into(),
        }
    }

    /// Create a backend unavailable error
    pub fn backend_unavailable(reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            reason: reason.into(),
        }
    }
}
