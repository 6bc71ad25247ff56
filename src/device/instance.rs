//! One addressable FIFO device

use std::sync::{
    atomic::{AtomicU64, AtomicU8, Ordering},
    Arc, Mutex, OnceLock,
};

use log::debug;

use crate::{
    control::{ControlChannel, ControlCommand, ControlReply},
    error::{FifoDevError, Result},
    fifo::{CircularBuffer, FifoInfo},
    host::DeviceNumber,
};

use super::{session::Session, stats::DeviceStats};

/// Lifecycle state of a device instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceState {
    /// Created during bring-up, not yet serving calls
    Pending = 0,
    /// Bring-up completed; calls are served
    Live = 1,
    /// Teardown started; calls are refused
    Retired = 2,
}

impl DeviceState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Pending,
            1 => Self::Live,
            _ => Self::Retired,
        }
    }
}

/// A FIFO device with its identity and lifecycle state
///
/// The buffer sits behind a mutex: every read, write and control command is
/// one critical section. The state is checked inside that section, so once
/// teardown has retired the instance and taken the lock, no call can touch
/// the buffer again.
#[derive(Debug)]
pub struct DeviceInstance {
    id: usize,
    name: String,
    number: OnceLock<DeviceNumber>,
    state: AtomicU8,
    fifo: Mutex<Option<CircularBuffer>>,
    next_session: AtomicU64,
    stats: DeviceStats,
}

impl DeviceInstance {
    pub(crate) fn new(id: usize, name: impl Into<String>, fifo: CircularBuffer) -> Self {
        Self {
            id,
            name: name.into(),
            number: OnceLock::new(),
            state: AtomicU8::new(DeviceState::Pending as u8),
            fifo: Mutex::new(Some(fifo)),
            next_session: AtomicU64::new(1),
            stats: DeviceStats::default(),
        }
    }

    /// Index of the instance in its registry
    pub fn id(&self) -> usize {
        self.id
    }

    /// Published name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device number, once routing registration has assigned it
    pub fn number(&self) -> Option<DeviceNumber> {
        self.number.get().copied()
    }

    pub fn state(&self) -> DeviceState {
        DeviceState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_live(&self) -> bool {
        self.state() == DeviceState::Live
    }

    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    /// Open a new session
    pub fn open(self: &Arc<Self>) -> Result<Session> {
        if !self.is_live() {
            return Err(FifoDevError::unavailable(&self.name));
        }

        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let open = self.stats.record_open();
        debug!("{}: session {} opened ({} open)", self.name, id, open);
        Ok(Session::new(id, Arc::clone(self)))
    }

    /// Write as many bytes as fit, returning the count written
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let written = self.with_fifo(|fifo| fifo.write(data))?;
        self.stats.record_write(data.len(), written);
        debug!("{}: wrote {} of {} bytes", self.name, written, data.len());
        Ok(written)
    }

    /// Remove up to `max` bytes
    pub fn read(&self, max: usize) -> Result<Vec<u8>> {
        let data = self.with_fifo(|fifo| fifo.read(max))?;
        self.stats.record_read(data.len());
        debug!("{}: read {} bytes", self.name, data.len());
        Ok(data)
    }

    /// Remove up to `out.len()` bytes into `out`
    pub fn read_into(&self, out: &mut [u8]) -> Result<usize> {
        let count = self.with_fifo(|fifo| fifo.read_into(out))?;
        self.stats.record_read(count);
        debug!("{}: read {} bytes", self.name, count);
        Ok(count)
    }

    /// Current capacity, free space and length
    pub fn info(&self) -> Result<FifoInfo> {
        self.with_fifo(|fifo| fifo.info())
    }

    /// Execute a control command
    pub fn control(&self, command: ControlCommand) -> Result<ControlReply> {
        let result = ControlChannel::new(self).dispatch(command);
        self.stats.record_control(result.is_ok());
        result
    }

    /// Run `f` on the buffer while holding the lock, if the instance is live
    pub(crate) fn with_fifo<R>(&self, f: impl FnOnce(&mut CircularBuffer) -> R) -> Result<R> {
        let mut guard = self
            .fifo
            .lock()
            .map_err(|_| FifoDevError::unavailable(&self.name))?;

        if !self.is_live() {
            return Err(FifoDevError::unavailable(&self.name));
        }
        let fifo = guard
            .as_mut()
            .ok_or_else(|| FifoDevError::unavailable(&self.name))?;
        Ok(f(fifo))
    }

    pub(crate) fn session_closed(&self, session: u64) {
        self.stats.record_close();
        debug!("{}: session {} closed", self.name, session);
    }

    pub(crate) fn assign_number(&self, number: DeviceNumber) -> Result<()> {
        self.number.set(number).map_err(|_| {
            FifoDevError::invalid_parameter("number", format!("{} already numbered", self.name))
        })
    }

    pub(crate) fn activate(&self) {
        let _ = self.state.compare_exchange(
            DeviceState::Pending as u8,
            DeviceState::Live as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub(crate) fn retire(&self) {
        self.state
            .store(DeviceState::Retired as u8, Ordering::Release);
    }

    /// Drop the buffer, returning its capacity. Waits for in-flight calls.
    pub(crate) fn free_buffer(&self) -> usize {
        let mut guard = match self.fifo.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take().map_or(0, |fifo| fifo.capacity())
    }
}
