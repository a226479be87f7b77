//! Pure model of the streaming offload benchmarks.
//!
//! This crate has **no hardware access**. It describes what a benchmark
//! run is: which variant, which streams, what the seeded inputs look like and
//! what the device must produce from them. The driver and the harness build
//! on these definitions.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`defaults`] | Scalar type, default item/iteration counts, tolerance |
//! | [`variant`] | `Variant` descriptor and its name grammar |
//! | [`pattern`] | Deterministic seed pattern and closed-form expected values |
//! | [`record`] | Interleaved-record packing for the `_struct` variants |
//! | [`error`] | Parse and layout errors |
//!
//! # Variants
//!
//! ```text
//! 4loads  4loads_struct  5loads  8loads  8loads_profiling
//! 4stores 4stores_struct 5stores 8stores 8stores_profiling
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod error;
pub mod pattern;
pub mod record;
pub mod variant;

pub use defaults::Scalar;
pub use error::{LayoutError, VariantParseError};
pub use variant::{Direction, Layout, TimingMode, Variant};
