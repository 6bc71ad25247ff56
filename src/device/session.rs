//! Open handle on a device instance

use std::sync::Arc;

use crate::{
    control::{ControlCommand, ControlReply},
    error::{FifoDevError, Result},
    fifo::FifoInfo,
};

use super::instance::DeviceInstance;

/// One open session on a device
///
/// Sessions on the same device share its FIFO; concurrent readers compete
/// for the same bytes. Dropping a session closes it.
#[derive(Debug)]
pub struct Session {
    id: u64,
    instance: Arc<DeviceInstance>,
    open: bool,
}

impl Session {
    pub(crate) fn new(id: u64, instance: Arc<DeviceInstance>) -> Self {
        Self {
            id,
            instance,
            open: true,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Device this session is bound to
    pub fn device(&self) -> &Arc<DeviceInstance> {
        &self.instance
    }

    /// Write as many bytes as fit
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        self.instance.write(data)
    }

    /// Read up to `max` bytes
    pub fn read(&self, max: usize) -> Result<Vec<u8>> {
        self.instance.read(max)
    }

    /// Read into a caller buffer
    pub fn read_into(&self, out: &mut [u8]) -> Result<usize> {
        self.instance.read_into(out)
    }

    /// Execute a typed control command
    pub fn control(&self, command: ControlCommand) -> Result<ControlReply> {
        self.instance.control(command)
    }

    /// Execute a raw control request
    ///
    /// `arg` carries the request payload (RESIZE) or receives the result
    /// record (INFO).
    pub fn ioctl(&self, request: u32, arg: &mut [u8]) -> Result<()> {
        let command = ControlCommand::decode(request, arg)?;
        match self.control(command)? {
            ControlReply::Info(info) => {
                let out = arg.get_mut(..FifoInfo::SIZE).ok_or_else(|| {
                    FifoDevError::invalid_parameter("arg", "info argument too small")
                })?;
                out.copy_from_slice(&info.to_bytes());
                Ok(())
            }
            ControlReply::Done => Ok(()),
        }
    }

    /// Close the session
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.open {
            self.open = false;
            self.instance.session_closed(self.id);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}
