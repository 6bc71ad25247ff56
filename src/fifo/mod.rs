//! Bounded byte FIFO used as the backing store of every device

pub mod buffer;
pub mod info;


pub use buffer::{validate_capacity, CircularBuffer};
pub use info::FifoInfo;
