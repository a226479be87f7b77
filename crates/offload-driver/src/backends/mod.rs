//! Accelerator backend implementations
//!
//! One backend is available:
//! - **Software**: host thread emulating a device with private memory and an
//!   asynchronous in-order queue (CI, development, harness validation)

pub mod software;

pub use software::SoftwareBackend;
