//! Control channel: clear, info and resize commands

pub mod channel;
pub mod codes;
pub mod command;


pub use channel::ControlChannel;
pub use codes::{FIFO_CLEAR, FIFO_INFO, FIFO_RESIZE};
pub use command::{ControlCommand, ControlReply};
