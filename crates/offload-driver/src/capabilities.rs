//! Device capability reporting
//!
//! Queried once when the backend is created. The harness only acts on
//! `profiling_supported`; the rest is printed for identification.

/// Capabilities reported by an accelerator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Human-readable device name
    pub name: String,

    /// Vendor / implementation string
    pub vendor: String,

    /// Largest work-group the device accepts
    pub max_work_group_size: usize,

    /// Parallel compute units
    pub max_compute_units: u32,

    /// Device memory in bytes
    pub global_mem_bytes: usize,

    /// Whether kernel events can carry start/end timestamps
    pub profiling_supported: bool,
}

impl DeviceCapabilities {
    /// Device memory in megabytes (rounded down)
    pub const fn global_mem_mb(&self) -> usize {
        self.global_mem_bytes / (1024 * 1024)
    }
}

impl std::fmt::Display for DeviceCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {} CUs, work-group ≤ {}, {} MB, profiling {}",
            self.name,
            self.vendor,
            self.max_compute_units,
            self.max_work_group_size,
            self.global_mem_mb(),
            if self.profiling_supported { "yes" } else { "no" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_profiling() {
        let caps = DeviceCapabilities {
            name: "dev".into(),
            vendor: "test".into(),
            max_work_group_size: 256,
            max_compute_units: 4,
            global_mem_bytes: 64 * 1024 * 1024,
            profiling_supported: false,
        };
        let s = caps.to_string();
        assert!(s.contains("64 MB"));
        assert!(s.ends_with("profiling no"));
        assert_eq!(s, "dev (test): 4 CUs, work-group ≤ 256, 64 MB, profiling no");
    }
}
