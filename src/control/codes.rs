//! Raw ioctl request codes of the control protocol

use std::ffi::c_long;

use crate::fifo::FifoInfo;

/// ioctl type byte shared by all FIFO requests
pub const FIFO_IOC_MAGIC: u8 = b'x';

/// Size of the RESIZE payload
pub const RESIZE_ARG_SIZE: usize = std::mem::size_of::<c_long>();

/// Drop all buffered bytes
pub const FIFO_CLEAR: u32 = nix::request_code_none!(FIFO_IOC_MAGIC, 1) as u32;

/// Read back a [`FifoInfo`] record
pub const FIFO_INFO: u32 = nix::request_code_read!(FIFO_IOC_MAGIC, 2, FifoInfo::SIZE) as u32;

/// Change the capacity; payload is a native `long`
pub const FIFO_RESIZE: u32 = nix::request_code_write!(FIFO_IOC_MAGIC, 3, RESIZE_ARG_SIZE) as u32;

/// Human-readable name of a request code
pub fn request_name(request: u32) -> Option<&'static str> {
    match request {
        FIFO_CLEAR => Some("FIFO_CLEAR"),
        FIFO_INFO => Some("FIFO_INFO"),
        FIFO_RESIZE => Some("FIFO_RESIZE"),
        _ => None,
    }
}
