//! # fifodev - Bounded FIFO pseudo-devices
//!
//! fifodev exposes a configurable number of independent byte-stream devices,
//! each backed by a small bounded circular buffer, plus a control channel to
//! clear, inspect or resize that buffer.
//!
//! ## Features
//!
//! - **Bounded FIFOs**: lossy on overflow, short reads when empty, never block
//! - **Control channel**: CLEAR / INFO / RESIZE, typed or as raw ioctl codes
//! - **Staged bring-up**: every acquire is paired with a release; a failure
//!   part-way unwinds exactly what succeeded, in reverse order
//! - **Pluggable host**: numbering, publication and routing go through the
//!   [`DeviceHost`] trait; [`LocalHost`] keeps it all in process
//! - **Thread-safe**: one mutex per FIFO, sessions may be used from any thread
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                DeviceRegistry                 │
//! │  table -> buffers -> ids -> publish -> route  │
//! └───────────────────────────────────────────────┘
//!           │                         │
//!           ▼                         ▼
//! ┌──────────────────┐    ┌───────────────────────┐
//! │  DeviceInstance  │◄───│  DeviceHost           │
//! │  Mutex<FIFO>     │    │  (LocalHost, ...)     │
//! └──────────────────┘    └───────────────────────┘
//!           │
//!           ▼
//! ┌──────────────────┐
//! │ Session / ioctl  │
//! │ ControlChannel   │
//! └──────────────────┘
//! ```

pub mod control;
pub mod device;
pub mod error;
pub mod fifo;
pub mod host;
pub mod registry;

// Main API re-exports
pub use control::{ControlChannel, ControlCommand, ControlReply, FIFO_CLEAR, FIFO_INFO, FIFO_RESIZE};
pub use device::{DeviceInstance, DeviceState, DeviceStats, Session};
pub use error::{FifoDevError, Result};
pub use fifo::{CircularBuffer, FifoInfo};
pub use host::{ClassHandle, DeviceHost, DeviceNumber, HostLimits, HostStats, IdentityBlock, LocalHost};
pub use registry::{DeviceRegistry, RegistryConfig, RegistryState, Stage};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration constants
pub mod config {
    /// Default FIFO capacity in bytes
    pub const DEFAULT_CAPACITY: usize = 32;

    /// Default number of device instances
    pub const DEFAULT_DEVICES: i32 = 1;

    /// Largest FIFO capacity; INFO reports sizes as 16-bit signed fields
    pub const MAX_CAPACITY: usize = i16::MAX as usize;

    /// Default published name prefix
    pub const DEFAULT_NAME_PREFIX: &str = "fifodev";

    /// Default publication class name
    pub const DEFAULT_CLASS_NAME: &str = "fifodev_class";
}
