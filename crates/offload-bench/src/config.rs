//! Harness configuration
//!
//! Everything a run depends on is passed in through `HarnessConfig`; there
//! is no global state, so tests can run tiny configurations side by side.

use offload_model::defaults::{DEFAULT_ITEMS, DEFAULT_ITERATIONS, TOLERANCE};
use offload_model::{Scalar, Variant};

use crate::error::{BenchError, Result};

/// Parameters of one benchmark run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarnessConfig {
    /// Benchmark variant
    pub variant: Variant,
    /// Elements per stream
    pub items: usize,
    /// Trials
    pub iterations: usize,
    /// Largest accepted deviation in verification
    pub tolerance: Scalar,
}

impl HarnessConfig {
    /// Defaults for `variant`: 10M items, 100 iterations, 1e-6 tolerance
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            items: DEFAULT_ITEMS,
            iterations: DEFAULT_ITERATIONS,
            tolerance: TOLERANCE,
        }
    }

    /// Resolve the variant by name and use defaults for the rest
    ///
    /// # Errors
    ///
    /// Returns error if `name` is not a known variant.
    pub fn for_variant(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    /// Set elements per stream
    #[must_use]
    pub fn with_items(mut self, items: usize) -> Self {
        self.items = items;
        self
    }

    /// Set trial count
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set verification tolerance
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Scalar) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Reject configurations that cannot produce a run
    ///
    /// # Errors
    ///
    /// Returns error for zero items, zero iterations or a non-positive tolerance.
    pub fn validate(&self) -> Result<()> {
        if self.items == 0 {
            return Err(BenchError::config("items per stream must be at least 1"));
        }
        if self.iterations == 0 {
            return Err(BenchError::config("iterations must be at least 1"));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(BenchError::config(format!("tolerance must be positive, got {}", self.tolerance)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_model() {
        let cfg = HarnessConfig::for_variant("8loads").unwrap();
        assert_eq!(cfg.items, 10_000_000);
        assert_eq!(cfg.iterations, 100);
        assert!((cfg.tolerance - 1e-6).abs() < f64::EPSILON);
        cfg.validate().unwrap();
    }

    #[test]
    fn unknown_variant_is_a_config_error() {
        assert!(matches!(HarnessConfig::for_variant("9loads"), Err(BenchError::Variant(_))));
    }

    #[test]
    fn zero_sizes_rejected() {
        let cfg = HarnessConfig::for_variant("4loads").unwrap();
        assert!(cfg.with_items(0).validate().is_err());
        assert!(cfg.with_iterations(0).validate().is_err());
        assert!(cfg.with_tolerance(0.0).validate().is_err());
        assert!(cfg.with_tolerance(f64::NAN).validate().is_err());
    }
}
