//! Host and device mirrors of the streams one variant touches.
//!
//! The host side always keeps separate arrays (`input`, `result`,
//! `stream_1..stream_k`) seeded with the deterministic pattern. The device
//! side holds only what the variant moves, in the variant's layout:
//!
//! ```text
//! load  / array  : stream_1..k            → result
//! load  / record : records[k × items]     → result
//! store / array  : input                  → stream_1..k
//! store / record : input                  → records[k × items]
//! ```
//!
//! Device buffers are released when the bundle is dropped.

use offload_driver::{Accelerator, DeviceBuffer, KernelLaunch};
use offload_model::defaults::SCALAR_BYTES;
use offload_model::pattern::{input_value, stream_value};
use offload_model::{Direction, Layout, Scalar, Variant};
use tracing::debug;

use crate::error::{BenchError, Result};

/// Host-resident streams, always in separate-array form
#[derive(Debug, Clone, PartialEq)]
pub struct HostStreams {
    /// `input[i] = i`
    pub input: Vec<Scalar>,
    /// Written back by load variants
    pub result: Vec<Scalar>,
    /// `stream_k[i] = i + k`; index 0 is stream 1
    pub streams: Vec<Vec<Scalar>>,
}

impl HostStreams {
    /// Seeded host streams for `count` secondary streams of `items` elements
    pub fn seeded(count: usize, items: usize) -> Self {
        Self {
            input: (0..items).map(input_value).collect(),
            result: vec![0.0; items],
            streams: (1..=count)
                .map(|k| (0..items).map(|i| stream_value(k, i)).collect())
                .collect(),
        }
    }

    /// Secondary streams as slices
    pub fn stream_slices(&self) -> Vec<&[Scalar]> {
        self.streams.iter().map(Vec::as_slice).collect()
    }
}

/// Device-resident buffers, shaped by the variant
#[derive(Debug)]
pub(crate) enum DeviceSide {
    LoadArrays {
        streams: Vec<DeviceBuffer>,
        result: DeviceBuffer,
    },
    LoadRecords {
        records: DeviceBuffer,
        result: DeviceBuffer,
    },
    StoreArrays {
        input: DeviceBuffer,
        streams: Vec<DeviceBuffer>,
    },
    StoreRecords {
        input: DeviceBuffer,
        records: DeviceBuffer,
    },
}

/// Every stream of one run, on both sides
#[derive(Debug)]
pub struct StreamBundle {
    variant: Variant,
    items: usize,
    pub(crate) host: HostStreams,
    pub(crate) device: DeviceSide,
    /// Interleaved host copy for record variants; empty otherwise
    pub(crate) staging: Vec<Scalar>,
}

impl StreamBundle {
    /// Allocate device and host mirrors for `variant` and seed the host side.
    ///
    /// The device is asked first, so a run that cannot fit never touches
    /// host memory.
    ///
    /// # Errors
    ///
    /// Returns a config error if the stream sizes overflow the address space,
    /// or a backend error if a device allocation fails.
    pub fn allocate(variant: Variant, items: usize, dev: &mut dyn Accelerator) -> Result<Self> {
        let count = variant.stream_count();
        let record_len = count
            .checked_mul(items)
            .filter(|len| len.checked_mul(SCALAR_BYTES).is_some())
            .ok_or_else(|| BenchError::config(format!("{count} streams × {items} items overflow the address space")))?;

        let (device, staging_len) = match (variant.direction(), variant.layout()) {
            (Direction::Load, Layout::Array) => {
                let streams = alloc_streams(dev, count, items)?;
                let result = dev.alloc(items)?;
                (DeviceSide::LoadArrays { streams, result }, 0)
            }
            (Direction::Store, Layout::Array) => {
                let input = dev.alloc(items)?;
                let streams = alloc_streams(dev, count, items)?;
                (DeviceSide::StoreArrays { input, streams }, 0)
            }
            (Direction::Load, Layout::Record) => {
                let records = dev.alloc(record_len)?;
                let result = dev.alloc(items)?;
                (DeviceSide::LoadRecords { records, result }, record_len)
            }
            (Direction::Store, Layout::Record) => {
                let input = dev.alloc(items)?;
                let records = dev.alloc(record_len)?;
                (DeviceSide::StoreRecords { input, records }, record_len)
            }
        };

        let host = HostStreams::seeded(count, items);
        let staging = vec![0.0; staging_len];

        debug!("StreamBundle: {variant} with {count} streams × {items} items allocated");

        Ok(Self {
            variant,
            items,
            host,
            device,
            staging,
        })
    }

    /// Variant this bundle was shaped for
    pub const fn variant(&self) -> Variant {
        self.variant
    }

    /// Elements per stream
    pub const fn items(&self) -> usize {
        self.items
    }

    /// Host mirrors
    pub const fn host(&self) -> &HostStreams {
        &self.host
    }

    /// The kernel launch matching this bundle's device buffers
    pub fn launch(&self) -> KernelLaunch<'_> {
        let width = self.variant.stream_count();
        match &self.device {
            DeviceSide::LoadArrays { streams, result } => KernelLaunch::load(streams.iter().collect(), result),
            DeviceSide::StoreArrays { input, streams } => KernelLaunch::store(input, streams.iter().collect()),
            DeviceSide::LoadRecords { records, result } => KernelLaunch::LoadRecords {
                records,
                width,
                result,
            },
            DeviceSide::StoreRecords { input, records } => KernelLaunch::StoreRecords {
                input,
                records,
                width,
            },
        }
    }
}

fn alloc_streams(dev: &mut dyn Accelerator, count: usize, items: usize) -> Result<Vec<DeviceBuffer>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(dev.alloc(items)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_driver::{QueueOptions, SoftwareBackend, SoftwareConfig};

    fn dev() -> SoftwareBackend {
        SoftwareBackend::new(SoftwareConfig::default(), QueueOptions::plain()).unwrap()
    }

    #[test]
    fn seeded_pattern() {
        let h = HostStreams::seeded(5, 4);
        assert_eq!(h.input, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(h.streams.len(), 5);
        assert_eq!(h.streams[0], vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(h.streams[4], vec![5.0, 6.0, 7.0, 8.0]);
        assert!(h.result.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn load_array_allocates_streams_and_result() {
        let mut d = dev();
        let b = StreamBundle::allocate("8loads".parse().unwrap(), 16, &mut d).unwrap();
        assert_eq!(d.allocated_bytes(), 9 * 16 * 8);
        assert!(matches!(b.launch(), KernelLaunch::Load { ref streams, .. } if streams.len() == 8));
        assert!(b.staging.is_empty());
    }

    #[test]
    fn store_record_allocates_input_and_records() {
        let mut d = dev();
        let b = StreamBundle::allocate("4stores_struct".parse().unwrap(), 10, &mut d).unwrap();
        assert_eq!(d.allocated_bytes(), (10 + 40) * 8);
        assert_eq!(b.staging.len(), 40);
        assert_eq!(b.launch().validate().unwrap(), 10);
    }

    #[test]
    fn dropping_bundle_releases_device_memory() {
        let mut d = dev();
        let b = StreamBundle::allocate("5stores".parse().unwrap(), 32, &mut d).unwrap();
        assert!(d.allocated_bytes() > 0);
        drop(b);
        assert_eq!(d.allocated_bytes(), 0);
    }

    #[test]
    fn overflowing_sizes_are_a_config_error() {
        let mut d = dev();
        for name in ["4loads_struct", "8stores"] {
            let err = StreamBundle::allocate(name.parse().unwrap(), usize::MAX / 2, &mut d).unwrap_err();
            assert!(matches!(err, BenchError::Config { .. }), "{name}: {err}");
        }
        assert_eq!(d.allocated_bytes(), 0);
    }

    #[test]
    fn device_refusal_comes_before_host_allocation() {
        // fits the address space, far exceeds any host or device memory
        let mut d = dev();
        let items = usize::MAX / (8 * SCALAR_BYTES) - 1;
        let err = StreamBundle::allocate("8loads".parse().unwrap(), items, &mut d).unwrap_err();
        assert!(matches!(err, BenchError::Backend { .. }), "{err}");
        assert_eq!(d.allocated_bytes(), 0);
    }

    #[test]
    fn every_variant_yields_a_valid_launch() {
        let mut d = dev();
        for v in Variant::all() {
            let b = StreamBundle::allocate(*v, 8, &mut d).unwrap();
            assert_eq!(b.launch().validate().unwrap(), 8, "{v}");
        }
    }
}
