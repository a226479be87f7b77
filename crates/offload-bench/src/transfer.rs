//! Host↔device transfer stage.
//!
//! Each call moves exactly the streams the variant needs and ends with a
//! queue wait, so a returned call means the data has arrived. Record
//! variants re-pack on the host: arrays → records before a load's upload,
//! records → arrays after a store's download. The re-pack is part of the
//! transfer phase.
//!
//! After the upload the host copy of whatever the device will produce is
//! poisoned with NaN, so a result can only pass verification if it really
//! came back from the device.

use offload_driver::Accelerator;
use offload_model::{record, Scalar};

use crate::error::Result;
use crate::streams::{DeviceSide, StreamBundle};

/// Copy the variant's operands host→device and wait.
///
/// # Errors
///
/// Returns error if a copy fails; the run cannot continue.
pub fn to_device(dev: &mut dyn Accelerator, bundle: &mut StreamBundle) -> Result<()> {
    let StreamBundle {
        host,
        device,
        staging,
        ..
    } = bundle;

    match device {
        DeviceSide::LoadArrays { streams, .. } => {
            for (buf, data) in streams.iter().zip(&host.streams) {
                dev.copy_to_device(buf, data)?;
            }
        }
        DeviceSide::LoadRecords { records, .. } => {
            record::pack(&host.stream_slices(), staging)?;
            dev.copy_to_device(records, staging)?;
        }
        DeviceSide::StoreArrays { input, .. } | DeviceSide::StoreRecords { input, .. } => {
            dev.copy_to_device(input, &host.input)?;
        }
    }

    dev.wait()?;
    poison_outputs(bundle);
    Ok(())
}

fn poison_outputs(bundle: &mut StreamBundle) {
    let StreamBundle {
        host,
        device,
        staging,
        ..
    } = bundle;

    match device {
        DeviceSide::LoadArrays { .. } | DeviceSide::LoadRecords { .. } => host.result.fill(Scalar::NAN),
        DeviceSide::StoreArrays { .. } => host.streams.iter_mut().for_each(|s| s.fill(Scalar::NAN)),
        DeviceSide::StoreRecords { .. } => {
            host.streams.iter_mut().for_each(|s| s.fill(Scalar::NAN));
            staging.fill(Scalar::NAN);
        }
    }
}

/// Copy the variant's results device→host and wait.
///
/// # Errors
///
/// Returns error if a copy fails; the run cannot continue.
pub fn to_host(dev: &mut dyn Accelerator, bundle: &mut StreamBundle) -> Result<()> {
    let StreamBundle {
        host,
        device,
        staging,
        ..
    } = bundle;

    match device {
        DeviceSide::LoadArrays { result, .. } | DeviceSide::LoadRecords { result, .. } => {
            dev.copy_to_host(&mut host.result, result)?;
        }
        DeviceSide::StoreArrays { streams, .. } => {
            for (buf, data) in streams.iter().zip(host.streams.iter_mut()) {
                dev.copy_to_host(data, buf)?;
            }
        }
        DeviceSide::StoreRecords { records, .. } => {
            dev.copy_to_host(staging, records)?;
            let mut outs: Vec<&mut [_]> = host.streams.iter_mut().map(Vec::as_mut_slice).collect();
            record::unpack(staging, &mut outs)?;
        }
    }

    dev.wait()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_driver::{QueueOptions, SoftwareBackend, SoftwareConfig};
    use offload_model::Variant;

    fn dev() -> SoftwareBackend {
        SoftwareBackend::new(SoftwareConfig::default(), QueueOptions::plain()).unwrap()
    }

    #[test]
    fn load_round_trip_without_compute_returns_zero_result() {
        let mut d = dev();
        let mut b = StreamBundle::allocate("4loads".parse::<Variant>().unwrap(), 8, &mut d).unwrap();
        b.host.result.fill(99.0);
        to_device(&mut d, &mut b).unwrap();
        to_host(&mut d, &mut b).unwrap();
        // device result was never written by a kernel
        assert!(b.host().result.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn upload_poisons_what_the_device_will_produce() {
        let mut d = dev();
        let mut load = StreamBundle::allocate("4loads".parse::<Variant>().unwrap(), 4, &mut d).unwrap();
        to_device(&mut d, &mut load).unwrap();
        assert!(load.host().result.iter().all(|r| r.is_nan()));
        assert_eq!(load.host().streams[0], vec![1.0, 2.0, 3.0, 4.0]);

        let mut store = StreamBundle::allocate("4stores_struct".parse::<Variant>().unwrap(), 4, &mut d).unwrap();
        to_device(&mut d, &mut store).unwrap();
        assert!(store.host().streams.iter().flatten().all(|v| v.is_nan()));
        assert!(store.staging.iter().all(|v| v.is_nan()));
        assert_eq!(store.host().input, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn store_arrays_download_replaces_poisoned_streams() {
        let mut d = dev();
        let mut b = StreamBundle::allocate("5stores".parse::<Variant>().unwrap(), 3, &mut d).unwrap();
        to_device(&mut d, &mut b).unwrap();
        let mut ev = d.dispatch(&b.launch()).unwrap();
        ev.wait().unwrap();
        to_host(&mut d, &mut b).unwrap();
        assert_eq!(b.host().streams[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(b.host().streams[4], vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn store_record_download_unpacks_into_arrays() {
        let mut d = dev();
        let mut b = StreamBundle::allocate("4stores_struct".parse::<Variant>().unwrap(), 3, &mut d).unwrap();
        to_device(&mut d, &mut b).unwrap();
        let mut ev = d.dispatch(&b.launch()).unwrap();
        ev.wait().unwrap();
        to_host(&mut d, &mut b).unwrap();
        assert_eq!(b.host().streams[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(b.host().streams[3], vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn load_record_upload_packs_fields() {
        let mut d = dev();
        let mut b = StreamBundle::allocate("4loads_struct".parse::<Variant>().unwrap(), 2, &mut d).unwrap();
        to_device(&mut d, &mut b).unwrap();
        assert_eq!(b.staging, vec![1.0, 2.0, 3.0, 4.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
