//! Error types and handling for fifodev

use nix::errno::Errno;

/// Result type alias for fifodev operations
pub type Result<T> = std::result::Result<T, FifoDevError>;

/// Error kinds surfaced by buffers, control commands and the device registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FifoDevError {
    /// Memory exhaustion while allocating a table or buffer
    #[error("Allocation failure: {what} ({bytes} bytes)")]
    AllocationFailure { what: String, bytes: usize },

    /// The host could not grant the requested block of device numbers
    #[error("Identity block exhausted: requested {requested}, available {available}")]
    IdentityExhausted { requested: u32, available: u32 },

    /// The host could not publish a device (or its class)
    #[error("Publication failure for {name}: {message}")]
    PublicationFailure { name: String, message: String },

    /// The host could not register a device for call routing
    #[error("Registration failure for device {index}: {message}")]
    RegistrationFailure { index: usize, message: String },

    /// Resize to a non-positive or out-of-range capacity
    #[error("Invalid capacity: {requested} (allowed 1..={max})")]
    InvalidCapacity { requested: i64, max: usize },

    /// Call addressed to an instance that is not live
    #[error("Device unavailable: {name}")]
    DeviceUnavailable { name: String },

    /// Unknown control request code
    #[error("Unsupported control request: {request:#x}")]
    UnsupportedCommand { request: u32 },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },
}

impl FifoDevError {
    /// Create an allocation failure error
    pub fn allocation(what: impl Into<String>, bytes: usize) -> Self {
        Self::AllocationFailure {
            what: what.into(),
            bytes,
        }
    }

    /// Create an identity exhausted error
    pub fn identity_exhausted(requested: u32, available: u32) -> Self {
        Self::IdentityExhausted {
            requested,
            available,
        }
    }

    /// Create a publication failure error
    pub fn publication(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PublicationFailure {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a registration failure error
    pub fn registration(index: usize, message: impl Into<String>) -> Self {
        Self::RegistrationFailure {
            index,
            message: message.into(),
        }
    }

    /// Create an invalid capacity error
    pub fn invalid_capacity(requested: i64) -> Self {
        Self::InvalidCapacity {
            requested,
            max: crate::config::MAX_CAPACITY,
        }
    }

    /// Create a device unavailable error
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self::DeviceUnavailable { name: name.into() }
    }

    /// Create an unsupported command error
    pub fn unsupported(request: u32) -> Self {
        Self::UnsupportedCommand { request }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Errno a host speaking the POSIX convention should report for this error
    pub fn errno(&self) -> Errno {
        match self {
            Self::AllocationFailure { .. } => Errno::ENOMEM,
            Self::IdentityExhausted { .. } => Errno::EBUSY,
            Self::PublicationFailure { .. } => Errno::EEXIST,
            Self::RegistrationFailure { .. } => Errno::EBUSY,
            Self::InvalidCapacity { .. } => Errno::EINVAL,
            Self::DeviceUnavailable { .. } => Errno::ENODEV,
            Self::UnsupportedCommand { .. } => Errno::ENOTTY,
            Self::InvalidParameter { .. } => Errno::EINVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = FifoDevError::allocation("buffer", 32);
        assert!(matches!(err, FifoDevError::AllocationFailure { bytes: 32, .. }));

        let err = FifoDevError::unavailable("fifodev0");
        assert!(matches!(err, FifoDevError::DeviceUnavailable { .. }));

        let err = FifoDevError::invalid_capacity(-4);
        assert!(matches!(err, FifoDevError::InvalidCapacity { requested: -4, .. }));
    }

    #[test]
    fn test_error_display() {
        let err = FifoDevError::publication("fifodev1", "name already taken");
        let display = format!("{}", err);
        assert!(display.contains("Publication failure"));
        assert!(display.contains("fifodev1"));
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(FifoDevError::allocation("table", 0).errno(), Errno::ENOMEM);
        assert_eq!(FifoDevError::unsupported(0x7801).errno(), Errno::ENOTTY);
        assert_eq!(FifoDevError::invalid_capacity(0).errno(), Errno::EINVAL);
        assert_eq!(FifoDevError::unavailable("x").errno(), Errno::ENODEV);
    }
}
