//! Software device backend
//!
//! Implements `Accelerator` with a dedicated device thread. The thread owns
//! device memory outright and drains an in-order command queue, so the host
//! side sees the same asynchrony a real accelerator queue has:
//!
//! ```text
//! host thread                         device thread
//! ───────────                         ─────────────
//! copy_to_device ── Write ──────────▶ memcpy into device buffer
//! dispatch       ── Launch ─────────▶ run kernel, stamp start/end
//!   (returns KernelEvent)             ──▶ event completes
//! wait           ── Fence ──────────▶ reply once everything before it ran
//! copy_to_host   ── Read ───────────▶ reply with buffer contents
//! ```
//!
//! Nothing is shared between the two sides except the channel; a copy is the
//! only way data moves between host and device memory.
//!
//! A failure on the device thread is never swallowed: reads and kernels
//! carry their own error back, and a failed write is held until the next
//! `wait()`, which returns it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use offload_model::defaults::SCALAR_BYTES;
use offload_model::Scalar;
use tracing::{debug, info, trace, warn};

use crate::backend::{Accelerator, BackendType, QueueOptions};
use crate::buffer::{BufferId, DeviceBuffer};
use crate::capabilities::DeviceCapabilities;
use crate::error::{OffloadError, Result};
use crate::event::{Completion, EventTimestamps, KernelEvent};
use crate::kernel::{self, KernelLaunch, KernelOp};

/// Software device parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareConfig {
    /// Device name reported in capabilities
    pub name: String,
    /// Device memory budget in bytes
    pub global_mem_bytes: usize,
    /// Whether the device can timestamp kernel events
    pub profiling_supported: bool,
}

impl Default for SoftwareConfig {
    fn default() -> Self {
        Self {
            name: "offload software device".to_string(),
            global_mem_bytes: 4 * 1024 * 1024 * 1024,
            profiling_supported: true,
        }
    }
}

impl SoftwareConfig {
    /// Device that cannot timestamp kernels
    #[must_use]
    pub fn without_profiling(mut self) -> Self {
        self.profiling_supported = false;
        self
    }

    /// Override the memory budget
    #[must_use]
    pub fn with_memory(mut self, bytes: usize) -> Self {
        self.global_mem_bytes = bytes;
        self
    }
}

static NEXT_DEVICE: AtomicU32 = AtomicU32::new(1);

enum Command {
    Alloc { id: BufferId, len: usize },
    Free { id: BufferId },
    Write { id: BufferId, data: Vec<Scalar> },
    Read { id: BufferId, reply: Sender<Result<Vec<Scalar>>> },
    Launch { op: KernelOp, submit_ns: u64, done: Sender<Completion> },
    Fence { reply: Sender<Result<()>> },
    Shutdown,
}

/// Software accelerator backed by a device thread
#[derive(Debug)]
pub struct SoftwareBackend {
    caps: DeviceCapabilities,
    device: u32,
    profiling: bool,
    epoch: Instant,
    queue: Sender<Command>,
    worker: Option<JoinHandle<()>>,
    next_id: u32,
    allocated: Arc<AtomicUsize>,
}

impl SoftwareBackend {
    /// Start the device thread and create the queue.
    ///
    /// If profiling is requested but `config` says the device cannot
    /// timestamp kernels, a warning is logged and the queue is created
    /// without it.
    ///
    /// # Errors
    ///
    /// Returns error if the device thread cannot be spawned.
    pub fn new(config: SoftwareConfig, options: QueueOptions) -> Result<Self> {
        if options.enable_profiling && !config.profiling_supported {
            warn!("Device '{}' does not support profiling; kernel events carry no timestamps", config.name);
        }
        let profiling = options.enable_profiling && config.profiling_supported;

        let caps = DeviceCapabilities {
            name: config.name,
            vendor: "offload-driver".to_string(),
            max_work_group_size: 1,
            max_compute_units: 1,
            global_mem_bytes: config.global_mem_bytes,
            profiling_supported: config.profiling_supported,
        };

        let epoch = Instant::now();
        let (tx, rx) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("offload-device".to_string())
            .spawn(move || device_loop(&rx, epoch))
            .map_err(|e| OffloadError::backend_unavailable(format!("cannot start device thread: {e}")))?;

        info!("SoftwareBackend: {} (profiling {})", caps.name, if profiling { "on" } else { "off" });

        Ok(Self {
            caps,
            device: NEXT_DEVICE.fetch_add(1, Ordering::Relaxed),
            profiling,
            epoch,
            queue: tx,
            worker: Some(worker),
            next_id: 1,
            allocated: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Device memory currently held by live buffers, in bytes
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    /// Tag carried by every buffer this device allocates
    pub const fn device_id(&self) -> u32 {
        self.device
    }

    fn check_owned(&self, buf: &DeviceBuffer) -> Result<()> {
        if buf.id().device() == self.device {
            Ok(())
        } else {
            Err(OffloadError::transfer_failed(format!(
                "buffer {} belongs to another device",
                buf.id()
            )))
        }
    }

    fn submit(&self, cmd: Command) -> Result<()> {
        self.queue
            .send(cmd)
            .map_err(|_| OffloadError::device_lost("device thread exited"))
    }

    fn now_ns(&self) -> u64 {
        elapsed_ns(self.epoch)
    }
}

impl Accelerator for SoftwareBackend {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Software
    }

    fn profiling_enabled(&self) -> bool {
        self.profiling
    }

    fn alloc(&mut self, len: usize) -> Result<DeviceBuffer> {
        let used = self.allocated.load(Ordering::SeqCst);
        let available = self.caps.global_mem_bytes.saturating_sub(used);
        let bytes = match len.checked_mul(SCALAR_BYTES) {
            Some(bytes) if bytes <= available => bytes,
            requested => {
                return Err(OffloadError::OutOfDeviceMemory {
                    requested: requested.unwrap_or(usize::MAX),
                    available,
                })
            }
        };

        let id = BufferId::on_device(self.device, self.next_id);
        self.next_id += 1;
        self.submit(Command::Alloc { id, len })?;
        self.allocated.fetch_add(bytes, Ordering::SeqCst);
        debug!("SoftwareBackend: alloc buffer {id} ({len} elements)");

        let queue = self.queue.clone();
        let allocated = Arc::clone(&self.allocated);
        Ok(DeviceBuffer::new(id, len, move |id| {
            allocated.fetch_sub(bytes, Ordering::SeqCst);
            // device may already be gone; its memory went with it
            let _ = queue.send(Command::Free { id });
        }))
    }

    fn copy_to_device(&mut self, dst: &DeviceBuffer, src: &[Scalar]) -> Result<()> {
        self.check_owned(dst)?;
        if src.len() != dst.len() {
            return Err(OffloadError::SizeMismatch {
                operation: "copy_to_device",
                host: src.len(),
                device: dst.len(),
            });
        }
        trace!("SoftwareBackend: H→D buffer {} ({} elements)", dst.id(), src.len());
        self.submit(Command::Write {
            id: dst.id(),
            data: src.to_vec(),
        })
    }

    fn copy_to_host(&mut self, dst: &mut [Scalar], src: &DeviceBuffer) -> Result<()> {
        self.check_owned(src)?;
        if dst.len() != src.len() {
            return Err(OffloadError::SizeMismatch {
                operation: "copy_to_host",
                host: dst.len(),
                device: src.len(),
            });
        }
        let (tx, rx) = mpsc::channel();
        self.submit(Command::Read {
            id: src.id(),
            reply: tx,
        })?;
        let data = rx
            .recv()
            .map_err(|_| OffloadError::device_lost("device thread exited during read"))??;
        if data.len() != dst.len() {
            return Err(OffloadError::SizeMismatch {
                operation: "copy_to_host",
                host: dst.len(),
                device: data.len(),
            });
        }
        trace!("SoftwareBackend: D→H buffer {} ({} elements)", src.id(), dst.len());
        dst.copy_from_slice(&data);
        Ok(())
    }

    fn dispatch(&mut self, launch: &KernelLaunch<'_>) -> Result<KernelEvent> {
        let items = launch.validate()?;
        if let Some(foreign) = launch.buffers().into_iter().find(|b| self.check_owned(b).is_err()) {
            return Err(OffloadError::invalid_launch(
                launch.name(),
                format!("buffer {} belongs to another device", foreign.id()),
            ));
        }
        let (tx, rx) = mpsc::channel();
        self.submit(Command::Launch {
            op: launch.to_op(),
            submit_ns: self.now_ns(),
            done: tx,
        })?;
        trace!("SoftwareBackend: dispatch {} over {items} elements", launch.name());
        Ok(KernelEvent::pending(launch.name(), self.profiling, rx))
    }

    fn wait(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        self.submit(Command::Fence { reply: tx })?;
        rx.recv()
            .map_err(|_| OffloadError::device_lost("device thread exited during wait"))?
    }
}

impl Drop for SoftwareBackend {
    fn drop(&mut self) {
        let _ = self.queue.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("SoftwareBackend: device thread panicked");
            }
        }
    }
}

fn elapsed_ns(epoch: Instant) -> u64 {
    u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

fn device_loop(queue: &Receiver<Command>, epoch: Instant) {
    let mut memory: HashMap<BufferId, Vec<Scalar>> = HashMap::new();
    // first failure since the last fence
    let mut fault: Option<OffloadError> = None;

    while let Ok(cmd) = queue.recv() {
        match cmd {
            Command::Alloc { id, len } => {
                memory.insert(id, vec![0.0; len]);
            }
            Command::Free { id } => {
                memory.remove(&id);
            }
            Command::Write { id, data } => {
                if let Err(e) = write(&mut memory, id, &data) {
                    debug!("device: {e}");
                    fault.get_or_insert(e);
                }
            }
            Command::Read { id, reply } => {
                let data = memory.get(&id).cloned().ok_or_else(|| not_resident(id));
                let _ = reply.send(data);
            }
            Command::Launch { op, submit_ns, done } => {
                let start_ns = elapsed_ns(epoch);
                let outcome = execute(&mut memory, &op).map(|()| EventTimestamps {
                    submit_ns,
                    start_ns,
                    end_ns: elapsed_ns(epoch),
                });
                if let Err(e) = &outcome {
                    debug!("device: {e}");
                    fault.get_or_insert_with(|| e.clone());
                }
                let _ = done.send(outcome);
            }
            Command::Fence { reply } => {
                let _ = reply.send(fault.take().map_or(Ok(()), Err));
            }
            Command::Shutdown => break,
        }
    }
    debug!("device: queue closed, releasing {} buffers", memory.len());
}

fn not_resident(id: BufferId) -> OffloadError {
    OffloadError::transfer_failed(format!("buffer {id} is not resident on the device"))
}

fn write(memory: &mut HashMap<BufferId, Vec<Scalar>>, id: BufferId, data: &[Scalar]) -> Result<()> {
    let buf = memory.get_mut(&id).ok_or_else(|| not_resident(id))?;
    if buf.len() != data.len() {
        return Err(OffloadError::SizeMismatch {
            operation: "copy_to_device",
            host: data.len(),
            device: buf.len(),
        });
    }
    buf.copy_from_slice(data);
    Ok(())
}

fn execute(memory: &mut HashMap<BufferId, Vec<Scalar>>, op: &KernelOp) -> Result<()> {
    let missing = |id: &BufferId| {
        OffloadError::invalid_launch(op.name(), format!("buffer {id} is not resident on the device"))
    };
    if let Some(id) = op.buffers().iter().find(|id| !memory.contains_key(*id)) {
        return Err(missing(id));
    }

    // the output is taken out of device memory while the inputs are borrowed
    match op {
        KernelOp::Load { streams, result } => {
            let mut out = memory.remove(result).ok_or_else(|| missing(result))?;
            let inputs = streams
                .iter()
                .map(|id| memory.get(id).map(Vec::as_slice).ok_or_else(|| missing(id)))
                .collect::<Result<Vec<&[Scalar]>>>();
            let outcome = inputs.map(|inputs| kernel::load_sum(&inputs, &mut out));
            memory.insert(*result, out);
            outcome
        }
        KernelOp::Store { input, streams } => {
            let src = memory.remove(input).ok_or_else(|| missing(input))?;
            let mut outcome = Ok(());
            for (k, id) in streams.iter().enumerate() {
                match memory.get_mut(id) {
                    Some(out) => kernel::store_offset(&src, k + 1, out),
                    None => {
                        outcome = Err(missing(id));
                        break;
                    }
                }
            }
            memory.insert(*input, src);
            outcome
        }
        KernelOp::LoadRecords { records, width, result } => {
            let mut out = memory.remove(result).ok_or_else(|| missing(result))?;
            let outcome = match memory.get(records) {
                Some(src) => {
                    kernel::load_records(src, *width, &mut out);
                    Ok(())
                }
                None => Err(missing(records)),
            };
            memory.insert(*result, out);
            outcome
        }
        KernelOp::StoreRecords { input, records, width } => {
            let mut out = memory.remove(records).ok_or_else(|| missing(records))?;
            let outcome = match memory.get(input) {
                Some(src) => {
                    kernel::store_records(src, *width, &mut out);
                    Ok(())
                }
                None => Err(missing(input)),
            };
            memory.insert(*records, out);
            outcome
        }
    }
}
