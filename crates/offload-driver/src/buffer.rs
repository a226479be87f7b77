//! Device-resident buffers
//!
//! A `DeviceBuffer` is a handle to memory owned by the backend. Dropping the
//! handle releases the device allocation, so a buffer cannot outlive the run
//! that created it and is freed on every exit path.

use std::fmt;

/// Backend-assigned buffer identifier
///
/// Carries the id of the device that allocated it, so a handle from one
/// backend is never mistaken for a buffer of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId {
    device: u32,
    index: u32,
}

impl BufferId {
    /// Buffer `index` on device 0
    pub const fn new(index: u32) -> Self {
        Self::on_device(0, index)
    }

    /// Buffer `index` on `device`
    pub const fn on_device(device: u32, index: u32) -> Self {
        Self { device, index }
    }

    /// Per-device index
    pub const fn get(self) -> u32 {
        self.index
    }

    /// Owning device
    pub const fn device(self) -> u32 {
        self.device
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.index)
    }
}

type ReleaseFn = Box<dyn FnOnce(BufferId) + Send>;

/// Handle to a device allocation of `len` scalars
pub struct DeviceBuffer {
    id: BufferId,
    len: usize,
    release: Option<ReleaseFn>,
}

impl DeviceBuffer {
    /// Create a handle that calls `release` exactly once when dropped
    pub fn new(id: BufferId, len: usize, release: impl FnOnce(BufferId) + Send + 'static) -> Self {
        Self {
            id,
            len,
            release: Some(Box::new(release)),
        }
    }

    /// Create a handle with nothing to release (test doubles, views)
    pub const fn detached(id: BufferId, len: usize) -> Self {
        Self {
            id,
            len,
            release: None,
        }
    }

    /// Buffer id
    pub const fn id(&self) -> BufferId {
        self.id
    }

    /// Element count
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("id", &self.id)
            .field("len", &self.len)
            .field("owned", &self.release.is_some())
            .finish()
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn release_runs_once_on_drop() {
        let released = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&released);
        let buf = DeviceBuffer::new(BufferId::new(7), 16, move |id| {
            assert_eq!(id.get(), 7);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(buf.len(), 16);
        drop(buf);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ids_from_different_devices_differ() {
        let a = BufferId::on_device(1, 3);
        let b = BufferId::on_device(2, 3);
        assert_ne!(a, b);
        assert_eq!(a.get(), b.get());
        assert_eq!(b.device(), 2);
        assert_eq!(b.to_string(), "2:3");
    }

    #[test]
    fn detached_has_nothing_to_release() {
        let buf = DeviceBuffer::detached(BufferId::new(1), 0);
        assert!(buf.is_empty());
        assert!(format!("{buf:?}").contains("owned: false"));
    }
}
