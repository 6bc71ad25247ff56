//! Typed control commands and their raw encoding

use std::ffi::c_long;

use crate::{
    error::{FifoDevError, Result},
    fifo::FifoInfo,
};

use super::codes::{FIFO_CLEAR, FIFO_INFO, FIFO_RESIZE, RESIZE_ARG_SIZE};

/// Commands accepted by the control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Drop all buffered bytes
    Clear,
    /// Report capacity, free space and length
    Info,
    /// Change the capacity
    Resize(i64),
}

/// Result of a control command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReply {
    Done,
    Info(FifoInfo),
}

impl ControlCommand {
    /// Parse a raw request code and its argument buffer
    pub fn decode(request: u32, arg: &[u8]) -> Result<Self> {
        match request {
            FIFO_CLEAR => Ok(Self::Clear),
            FIFO_INFO => {
                if arg.len() < FifoInfo::SIZE {
                    return Err(FifoDevError::invalid_parameter(
                        "arg",
                        format!("INFO needs {} bytes, got {}", FifoInfo::SIZE, arg.len()),
                    ));
                }
                Ok(Self::Info)
            }
            FIFO_RESIZE => {
                let raw: [u8; RESIZE_ARG_SIZE] = arg
                    .get(..RESIZE_ARG_SIZE)
                    .and_then(|bytes| bytes.try_into().ok())
                    .ok_or_else(|| {
                        FifoDevError::invalid_parameter(
                            "arg",
                            format!("RESIZE needs {} bytes, got {}", RESIZE_ARG_SIZE, arg.len()),
                        )
                    })?;
                Ok(Self::Resize(i64::from(c_long::from_ne_bytes(raw))))
            }
            other => Err(FifoDevError::unsupported(other)),
        }
    }

    /// Raw request code
    pub fn request(&self) -> u32 {
        match self {
            Self::Clear => FIFO_CLEAR,
            Self::Info => FIFO_INFO,
            Self::Resize(_) => FIFO_RESIZE,
        }
    }

    /// Argument buffer to pass alongside [`ControlCommand::request`]
    ///
    /// INFO gets a zeroed buffer large enough for the reply. A RESIZE value
    /// that does not fit a native `long` fails with `InvalidCapacity`.
    pub fn encode_arg(&self) -> Result<Vec<u8>> {
        match *self {
            Self::Clear => Ok(Vec::new()),
            Self::Info => Ok(vec![0u8; FifoInfo::SIZE]),
            Self::Resize(capacity) => {
                let value = c_long::try_from(capacity)
                    .map_err(|_| FifoDevError::invalid_capacity(capacity))?;
                Ok(value.to_ne_bytes().to_vec())
            }
        }
    }
}
