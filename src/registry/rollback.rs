//! Stack of release steps recorded during bring-up

use crate::host::DeviceNumber;

use super::stage::Stage;

/// Undo action for one successful acquire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// Free the instance table
    Table { devices: usize },
    /// Free the FIFO of instance `index`
    Buffer { index: usize },
    /// Return the identity block
    Identities,
    /// Destroy the publication class
    Class,
    /// Unpublish instance `index`
    Publication { index: usize, number: DeviceNumber },
    /// Unregister instance `index` from routing
    Route { index: usize, number: DeviceNumber },
}

impl Release {
    /// Stage whose acquire this step undoes
    pub fn stage(&self) -> Stage {
        match self {
            Release::Table { .. } => Stage::Table,
            Release::Buffer { .. } => Stage::Buffers,
            Release::Identities => Stage::Identities,
            Release::Class | Release::Publication { .. } => Stage::Publication,
            Release::Route { .. } => Stage::Routing,
        }
    }
}

/// LIFO of release steps
///
/// Steps are pushed as acquires succeed and popped in reverse on rollback or
/// teardown, so undo order is always the exact inverse of acquire order.
#[derive(Debug, Default)]
pub struct RollbackStack {
    steps: Vec<Release>,
}

impl RollbackStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Release) {
        self.steps.push(step);
    }

    pub fn pop(&mut self) -> Option<Release> {
        self.steps.pop()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Pending steps, oldest first
    pub fn steps(&self) -> &[Release] {
        &self.steps
    }
}
