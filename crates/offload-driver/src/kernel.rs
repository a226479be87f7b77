//! Kernel launch descriptors and the point-wise transforms they run.
//!
//! | Kernel | Effect at element `i` |
//! |--------|-----------------------|
//! | `load` | `result[i] = Σ_k stream_k[i]` |
//! | `store` | `stream_k[i] = input[i] + k`, k = 1..=n |
//! | `load_records` | `result[i] = Σ_k record[i].field_k` |
//! | `store_records` | `record[i].field_k = input[i] + k` |
//!
//! The transforms are plain slice loops; a backend decides where they run.

use offload_model::Scalar;

use crate::buffer::{BufferId, DeviceBuffer};
use crate::error::{OffloadError, Result};

/// One kernel invocation with its device arguments
#[derive(Debug)]
pub enum KernelLaunch<'a> {
    /// Sum the secondary streams into `result`
    Load {
        /// Secondary streams, stream 1 first
        streams: Vec<&'a DeviceBuffer>,
        /// Output
        result: &'a DeviceBuffer,
    },
    /// Fan `input` out into the secondary streams
    Store {
        /// Input
        input: &'a DeviceBuffer,
        /// Secondary streams, stream 1 first
        streams: Vec<&'a DeviceBuffer>,
    },
    /// Sum the fields of each interleaved record into `result`
    LoadRecords {
        /// Records of `width` fields
        records: &'a DeviceBuffer,
        /// Fields per record
        width: usize,
        /// Output
        result: &'a DeviceBuffer,
    },
    /// Fan `input` out into the fields of each record
    StoreRecords {
        /// Input
        input: &'a DeviceBuffer,
        /// Records of `width` fields
        records: &'a DeviceBuffer,
        /// Fields per record
        width: usize,
    },
}

impl<'a> KernelLaunch<'a> {
    /// Load kernel over separate arrays
    pub fn load(streams: Vec<&'a DeviceBuffer>, result: &'a DeviceBuffer) -> Self {
        Self::Load { streams, result }
    }

    /// Store kernel over separate arrays
    pub fn store(input: &'a DeviceBuffer, streams: Vec<&'a DeviceBuffer>) -> Self {
        Self::Store { input, streams }
    }

    /// Kernel name as reported in events and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::Store { .. } => "store",
            Self::LoadRecords { .. } => "load_records",
            Self::StoreRecords { .. } => "store_records",
        }
    }

    /// Every device buffer the launch reads or writes
    pub fn buffers(&self) -> Vec<&'a DeviceBuffer> {
        match self {
            Self::Load { streams, result } | Self::Store { input: result, streams } => {
                let mut all = streams.clone();
                all.push(*result);
                all
            }
            Self::LoadRecords { records, result, .. } | Self::StoreRecords { input: result, records, .. } => {
                vec![*records, *result]
            }
        }
    }

    /// Check argument shapes and return the element count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLaunch` if there are no streams, lengths disagree, or
    /// a buffer appears twice.
    pub fn validate(&self) -> Result<usize> {
        let name = self.name();
        let items = match self {
            Self::Load { streams, result } | Self::Store { input: result, streams } => {
                if streams.is_empty() {
                    return Err(OffloadError::invalid_launch(name, "no secondary streams"));
                }
                for (k, s) in streams.iter().enumerate() {
                    if s.len() != result.len() {
                        return Err(OffloadError::invalid_launch(
                            name,
                            format!("stream {} has {} elements, expected {}", k + 1, s.len(), result.len()),
                        ));
                    }
                }
                result.len()
            }
            Self::LoadRecords { records, width, result }
            | Self::StoreRecords { input: result, records, width } => {
                if *width == 0 || Some(records.len()) != result.len().checked_mul(*width) {
                    return Err(OffloadError::invalid_launch(
                        name,
                        format!(
                            "{} record elements do not hold {} records of width {width}",
                            records.len(),
                            result.len()
                        ),
                    ));
                }
                result.len()
            }
        };

        let mut ids: Vec<BufferId> = self.buffers().iter().map(|b| b.id()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(OffloadError::invalid_launch(name, "a buffer is passed more than once"));
        }
        Ok(items)
    }

    /// Owned form handed to the device queue
    pub(crate) fn to_op(&self) -> KernelOp {
        let ids = |v: &[&DeviceBuffer]| -> Vec<BufferId> { v.iter().map(|b| b.id()).collect() };
        match self {
            Self::Load { streams, result } => KernelOp::Load {
                streams: ids(streams.as_slice()),
                result: result.id(),
            },
            Self::Store { input, streams } => KernelOp::Store {
                input: input.id(),
                streams: ids(streams.as_slice()),
            },
            Self::LoadRecords { records, width, result } => KernelOp::LoadRecords {
                records: records.id(),
                width: *width,
                result: result.id(),
            },
            Self::StoreRecords { input, records, width } => KernelOp::StoreRecords {
                input: input.id(),
                records: records.id(),
                width: *width,
            },
        }
    }
}

/// Launch with buffer ids only, safe to move to the device thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KernelOp {
    Load { streams: Vec<BufferId>, result: BufferId },
    Store { input: BufferId, streams: Vec<BufferId> },
    LoadRecords { records: BufferId, width: usize, result: BufferId },
    StoreRecords { input: BufferId, records: BufferId, width: usize },
}

impl KernelOp {
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::Store { .. } => "store",
            Self::LoadRecords { .. } => "load_records",
            Self::StoreRecords { .. } => "store_records",
        }
    }

    pub(crate) fn buffers(&self) -> Vec<BufferId> {
        match self {
            Self::Load { streams, result } | Self::Store { input: result, streams } => {
                let mut all = streams.clone();
                all.push(*result);
                all
            }
            Self::LoadRecords { records, result, .. } | Self::StoreRecords { input: result, records, .. } => {
                vec![*records, *result]
            }
        }
    }
}

/// `result[i] = Σ streams[k][i]`
pub fn load_sum(streams: &[&[Scalar]], result: &mut [Scalar]) {
    result.fill(0.0);
    for stream in streams {
        for (r, x) in result.iter_mut().zip(stream.iter()) {
            *r += x;
        }
    }
}

/// `stream[i] = input[i] + offset`
pub fn store_offset(input: &[Scalar], offset: usize, stream: &mut [Scalar]) {
    #[allow(clippy::cast_precision_loss)]
    let offset = offset as Scalar;
    for (s, x) in stream.iter_mut().zip(input) {
        *s = x + offset;
    }
}

/// `result[i] = Σ records[i * width + f]`
pub fn load_records(records: &[Scalar], width: usize, result: &mut [Scalar]) {
    for (r, record) in result.iter_mut().zip(records.chunks_exact(width)) {
        *r = record.iter().fold(0.0, |acc, x| acc + x);
    }
}

/// `records[i * width + f] = input[i] + f + 1`
pub fn store_records(input: &[Scalar], width: usize, records: &mut [Scalar]) {
    for (record, x) in records.chunks_exact_mut(width).zip(input) {
        for (f, field) in record.iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let offset = (f + 1) as Scalar;
            *field = x + offset;
        }
    }
}
