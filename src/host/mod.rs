//! Host environment the registry publishes devices into
//!
//! The host owns device numbering, name publication and call routing. The
//! registry only talks to it through [`DeviceHost`]; [`LocalHost`] is an
//! in-process implementation that keeps everything in memory.

pub mod local;
pub mod stats;
pub mod types;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::{device::DeviceInstance, error::Result};

pub use local::{HostLimits, LocalHost};
pub use stats::HostStats;
pub use types::{ClassHandle, DeviceNumber, IdentityBlock};

/// Services the host environment provides during bring-up and teardown
///
/// Every acquire has a matching release. Releases cannot fail; the registry
/// only ever releases what it successfully acquired, in reverse order.
pub trait DeviceHost: Send + Sync {
    /// Account for the instance table before it is allocated
    fn reserve_table(&self, devices: usize) -> Result<()> {
        let _ = devices;
        Ok(())
    }

    /// Return the table reservation
    fn release_table(&self, devices: usize) {
        let _ = devices;
    }

    /// Account for one device buffer before it is allocated
    fn reserve_buffer(&self, index: usize, bytes: usize) -> Result<()> {
        let _ = (index, bytes);
        Ok(())
    }

    /// Return a buffer reservation
    fn release_buffer(&self, index: usize, bytes: usize) {
        let _ = (index, bytes);
    }

    /// Allocate `count` consecutive device numbers
    fn alloc_identities(&self, count: u32, name: &str) -> Result<IdentityBlock>;

    /// Release a block obtained from [`DeviceHost::alloc_identities`]
    fn release_identities(&self, block: &IdentityBlock);

    /// Create the class devices are published under
    fn create_class(&self, name: &str) -> Result<ClassHandle>;

    /// Destroy a class. All of its devices have been unpublished.
    fn destroy_class(&self, class: &ClassHandle);

    /// Publish one device under a discoverable name
    fn publish(&self, class: &ClassHandle, number: DeviceNumber, name: &str) -> Result<()>;

    /// Remove a published device
    fn unpublish(&self, class: &ClassHandle, number: DeviceNumber);

    /// Route calls addressed to `number` to `instance`
    fn register_route(&self, number: DeviceNumber, instance: Arc<DeviceInstance>) -> Result<()>;

    /// Stop routing calls to `number`
    fn unregister_route(&self, number: DeviceNumber);
}
