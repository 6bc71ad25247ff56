//! Device instances and the sessions opened on them

pub mod instance;
pub mod session;
pub mod stats;

#[cfg(test)]
mod tests;

pub use instance::{DeviceInstance, DeviceState};
pub use session::Session;
pub use stats::DeviceStats;
