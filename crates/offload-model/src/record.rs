//! Interleaved-record layout.
//!
//! The `_struct` variants keep four streams as one buffer of records:
//!
//! ```text
//! arrays : s1[0] s1[1] …  | s2[0] s2[1] … | s3 … | s4 …
//! records: s1[0] s2[0] s3[0] s4[0] | s1[1] s2[1] s3[1] s4[1] | …
//! ```
//!
//! The host keeps the separate-array form; the device sees records. These
//! helpers transpose between the two.

use crate::defaults::Scalar;
use crate::error::LayoutError;

/// Fields per record for the `_struct` variants.
pub const RECORD_WIDTH: usize = 4;

fn check(streams: &[usize], records: usize) -> Result<usize, LayoutError> {
    let width = streams.len();
    if width == 0 || records % width != 0 {
        return Err(LayoutError::WidthMismatch { records, streams: width });
    }
    let expected = records / width;
    for (index, &len) in streams.iter().enumerate() {
        if len != expected {
            return Err(LayoutError::LengthMismatch {
                index,
                len,
                expected,
            });
        }
    }
    Ok(width)
}

/// Pack separate arrays into `records` (one field per stream).
///
/// # Errors
///
/// Returns an error if the streams differ in length or do not fill `records`.
pub fn pack(streams: &[&[Scalar]], records: &mut [Scalar]) -> Result<(), LayoutError> {
    let lens: Vec<usize> = streams.iter().map(|s| s.len()).collect();
    let width = check(&lens, records.len())?;
    for (i, record) in records.chunks_exact_mut(width).enumerate() {
        for (field, stream) in record.iter_mut().zip(streams) {
            *field = stream[i];
        }
    }
    Ok(())
}

/// Unpack `records` back into separate arrays.
///
/// # Errors
///
/// Returns an error if the streams differ in length or do not match `records`.
pub fn unpack(records: &[Scalar], streams: &mut [&mut [Scalar]]) -> Result<(), LayoutError> {
    let lens: Vec<usize> = streams.iter().map(|s| s.len()).collect();
    let width = check(&lens, records.len())?;
    for (i, record) in records.chunks_exact(width).enumerate() {
        for (field, stream) in record.iter().zip(streams.iter_mut()) {
            stream[i] = *field;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_interleaves_fields() {
        let a = [1.0, 2.0];
        let b = [10.0, 20.0];
        let c = [100.0, 200.0];
        let d = [1000.0, 2000.0];
        let mut records = [0.0; 8];
        pack(&[&a, &b, &c, &d], &mut records).unwrap();
        assert_eq!(records, [1.0, 10.0, 100.0, 1000.0, 2.0, 20.0, 200.0, 2000.0]);
    }

    #[test]
    fn unpack_restores_arrays() {
        let records = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let (mut a, mut b, mut c, mut d) = ([0.0; 2], [0.0; 2], [0.0; 2], [0.0; 2]);
        unpack(&records, &mut [&mut a, &mut b, &mut c, &mut d]).unwrap();
        assert_eq!(a, [1.0, 5.0]);
        assert_eq!(d, [4.0, 8.0]);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let a = [1.0, 2.0];
        let b = [1.0];
        let mut records = [0.0; 4];
        let err = pack(&[&a, &b], &mut records).unwrap_err();
        assert_eq!(
            err,
            LayoutError::LengthMismatch {
                index: 1,
                len: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn ragged_record_buffer_is_rejected() {
        let a = [1.0];
        let b = [1.0];
        let c = [1.0];
        let mut records = [0.0; 4];
        assert!(matches!(
            pack(&[&a, &b, &c], &mut records),
            Err(LayoutError::WidthMismatch { records: 4, streams: 3 })
        ));
    }

    #[test]
    fn width_mismatch_names_the_sizes_checked() {
        let (mut a, mut b) = ([0.0; 3], [0.0; 3]);
        let err = unpack(&[0.0; 7], &mut [&mut a, &mut b]).unwrap_err();
        assert_eq!(err, LayoutError::WidthMismatch { records: 7, streams: 2 });
        assert_eq!(err.to_string(), "7 record elements cannot be split across 2 streams");

        let err = pack(&[], &mut [0.0; 4]).unwrap_err();
        assert_eq!(err, LayoutError::WidthMismatch { records: 4, streams: 0 });
    }
}
