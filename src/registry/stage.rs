//! Bring-up stages and registry states

use std::fmt;

/// Ordered bring-up stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Allocate the instance table
    Table,
    /// Allocate one FIFO per instance
    Buffers,
    /// Obtain the block of device numbers
    Identities,
    /// Create the class and publish every instance
    Publication,
    /// Register every instance for call routing
    Routing,
}

impl Stage {
    /// All stages in bring-up order
    pub const ALL: [Stage; 5] = [
        Stage::Table,
        Stage::Buffers,
        Stage::Identities,
        Stage::Publication,
        Stage::Routing,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Table => "table",
            Stage::Buffers => "buffers",
            Stage::Identities => "identities",
            Stage::Publication => "publication",
            Stage::Routing => "routing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle state of a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Uninitialized,
    BringingUp(Stage),
    Live,
    RollingBack,
    TearingDown,
}

impl fmt::Display for RegistryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryState::Uninitialized => f.write_str("uninitialized"),
            RegistryState::BringingUp(stage) => write!(f, "bringing up ({})", stage),
            RegistryState::Live => f.write_str("live"),
            RegistryState::RollingBack => f.write_str("rolling back"),
            RegistryState::TearingDown => f.write_str("tearing down"),
        }
    }
}
