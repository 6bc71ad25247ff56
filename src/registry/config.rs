//! Registry configuration

use serde::{Deserialize, Serialize};

use crate::{
    config::{DEFAULT_CAPACITY, DEFAULT_CLASS_NAME, DEFAULT_DEVICES, DEFAULT_NAME_PREFIX},
    error::{FifoDevError, Result},
    fifo::validate_capacity,
};

/// Startup parameters of a device registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Number of device instances. Signed so that bad input reaches
    /// `validate` instead of being rejected at parse time.
    pub devices: i32,
    /// Capacity every FIFO starts with
    pub default_capacity: usize,
    /// Published name prefix; instance `i` is `<prefix><i>`
    pub name_prefix: String,
    /// Name of the publication class
    pub class_name: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            devices: DEFAULT_DEVICES,
            default_capacity: DEFAULT_CAPACITY,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            class_name: DEFAULT_CLASS_NAME.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Create a configuration for `devices` instances
    pub fn new(devices: i32) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    /// Set the number of devices
    pub fn with_devices(mut self, devices: i32) -> Self {
        self.devices = devices;
        self
    }

    /// Set the initial FIFO capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = capacity;
        self
    }

    /// Set the published name prefix
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Set the publication class name
    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = name.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.devices <= 0 {
            return Err(FifoDevError::invalid_parameter(
                "devices",
                format!("must be positive, got {}", self.devices),
            ));
        }

        validate_capacity(self.default_capacity)?;

        if self.name_prefix.is_empty() {
            return Err(FifoDevError::invalid_parameter(
                "name_prefix",
                "Name prefix cannot be empty",
            ));
        }

        if self.class_name.is_empty() {
            return Err(FifoDevError::invalid_parameter(
                "class_name",
                "Class name cannot be empty",
            ));
        }

        Ok(())
    }

    /// Validated device count
    pub fn device_count(&self) -> Result<usize> {
        usize::try_from(self.devices).ok().filter(|&n| n > 0).ok_or_else(|| {
            FifoDevError::invalid_parameter("devices", format!("must be positive, got {}", self.devices))
        })
    }

    /// Published name of instance `index`
    pub fn device_name(&self, index: usize) -> String {
        format!("{}{}", self.name_prefix, index)
    }
}
