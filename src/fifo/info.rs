//! Fixed-size info record returned by the INFO control request

use serde::{Deserialize, Serialize};

use crate::error::{FifoDevError, Result};

/// Capacity, free space and length of a FIFO
///
/// Laid out as three native-endian `i16` fields so it can be copied straight
/// into an ioctl argument buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoInfo {
    /// Total capacity in bytes
    pub capacity: i16,
    /// Free space in bytes
    pub available: i16,
    /// Buffered bytes
    pub length: i16,
}

impl FifoInfo {
    /// Size of the encoded record
    pub const SIZE: usize = std::mem::size_of::<FifoInfo>();

    /// Build a record from raw counts. Counts are clamped to `i16::MAX`.
    pub fn from_counts(capacity: usize, length: usize) -> Self {
        let clamp = |v: usize| i16::try_from(v).unwrap_or(i16::MAX);
        Self {
            capacity: clamp(capacity),
            available: clamp(capacity.saturating_sub(length)),
            length: clamp(length),
        }
    }

    /// Encode into the wire layout
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..2].copy_from_slice(&self.capacity.to_ne_bytes());
        out[2..4].copy_from_slice(&self.available.to_ne_bytes());
        out[4..6].copy_from_slice(&self.length.to_ne_bytes());
        out
    }

    /// Decode from the wire layout
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(FifoDevError::invalid_parameter(
                "info",
                format!("need {} bytes, got {}", Self::SIZE, bytes.len()),
            ));
        }

        let field = |i: usize| i16::from_ne_bytes([bytes[i], bytes[i + 1]]);
        Ok(Self {
            capacity: field(0),
            available: field(2),
            length: field(4),
        })
    }
}
