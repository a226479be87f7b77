//! Element type and run defaults.
//!
//! The benchmarks run in double precision. Switching `Scalar` to `f32`
//! halves every transfer and keeps the tolerance meaningful.

/// Element type of every stream.
pub type Scalar = f64;

/// Elements per stream when the caller does not say otherwise.
pub const DEFAULT_ITEMS: usize = 10_000_000;

/// Trials per run.
pub const DEFAULT_ITERATIONS: usize = 100;

/// Largest absolute deviation accepted by the verifier.
pub const TOLERANCE: Scalar = 1e-6;

/// Largest secondary-stream count of any variant.
pub const MAX_STREAMS: usize = 8;

/// Bytes moved per stream element.
pub const SCALAR_BYTES: usize = std::mem::size_of::<Scalar>();
