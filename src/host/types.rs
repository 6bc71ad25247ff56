//! Handles exchanged with the host environment

use std::fmt;

/// Major/minor pair identifying a published device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceNumber {
    pub major: u32,
    pub minor: u32,
}

impl DeviceNumber {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Contiguous range of device numbers granted by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityBlock {
    /// First number in the block
    pub first: DeviceNumber,
    /// Number of consecutive minors
    pub count: u32,
    /// Name the block was requested under
    pub name: String,
}

impl IdentityBlock {
    /// Number of the `index`-th device in the block
    pub fn number(&self, index: usize) -> Option<DeviceNumber> {
        let offset = u32::try_from(index).ok().filter(|&i| i < self.count)?;
        let minor = self.first.minor.checked_add(offset)?;
        Some(DeviceNumber::new(self.first.major, minor))
    }

    /// Check whether a number falls inside the block
    pub fn contains(&self, number: DeviceNumber) -> bool {
        number.major == self.first.major
            && number.minor >= self.first.minor
            && number.minor - self.first.minor < self.count
    }
}

/// Publication class under which device names are published
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassHandle {
    pub id: u64,
    pub name: String,
}
