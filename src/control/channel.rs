//! Dispatch of control commands onto a device's FIFO

use log::{debug, info};

use crate::{
    device::DeviceInstance,
    error::{FifoDevError, Result},
};

use super::command::{ControlCommand, ControlReply};

/// Stateless dispatcher bound to one device
#[derive(Debug, Clone, Copy)]
pub struct ControlChannel<'a> {
    device: &'a DeviceInstance,
}

impl<'a> ControlChannel<'a> {
    pub fn new(device: &'a DeviceInstance) -> Self {
        Self { device }
    }

    /// Execute `command` against the device's buffer
    ///
    /// Fails with `DeviceUnavailable` unless the device is live.
    pub fn dispatch(&self, command: ControlCommand) -> Result<ControlReply> {
        match command {
            ControlCommand::Clear => {
                self.device.with_fifo(|fifo| fifo.clear())?;
                debug!("{}: cleared", self.device.name());
                Ok(ControlReply::Done)
            }
            ControlCommand::Info => {
                let info = self.device.with_fifo(|fifo| fifo.info())?;
                Ok(ControlReply::Info(info))
            }
            ControlCommand::Resize(requested) => {
                let capacity = usize::try_from(requested)
                    .map_err(|_| FifoDevError::invalid_capacity(requested))?;

                let discarded = self.device.with_fifo(|fifo| fifo.resize(capacity))??;
                self.device.stats().record_discarded(discarded);
                info!(
                    "{}: resized to {} bytes ({} discarded)",
                    self.device.name(),
                    capacity,
                    discarded
                );
                Ok(ControlReply::Done)
            }
        }
    }
}
