//! In-process host: numbering, name publication and call routing in memory

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use log::{debug, warn};

use crate::{
    device::{DeviceInstance, Session},
    error::{FifoDevError, Result},
};

use super::{
    stats::HostStats,
    types::{ClassHandle, DeviceNumber, IdentityBlock},
    DeviceHost,
};

/// Resource limits of a [`LocalHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLimits {
    /// Lowest major handed out
    pub first_major: u32,
    /// Highest major handed out. Majors are allocated from the top down.
    pub last_major: u32,
    /// Largest block of minors a single request may take
    pub max_minors: u32,
    /// Total bytes tables and buffers may reserve, unlimited if `None`
    pub memory_budget: Option<usize>,
}

impl Default for HostLimits {
    fn default() -> Self {
        Self {
            first_major: 234,
            last_major: 254,
            max_minors: 1 << 20,
            memory_budget: None,
        }
    }
}

impl HostLimits {
    pub fn with_majors(mut self, first: u32, last: u32) -> Self {
        self.first_major = first;
        self.last_major = last;
        self
    }

    pub fn with_max_minors(mut self, max_minors: u32) -> Self {
        self.max_minors = max_minors;
        self
    }

    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }
}

#[derive(Debug, Default)]
struct LocalState {
    /// Allocated blocks keyed by major
    blocks: HashMap<u32, IdentityBlock>,
    /// Live classes by id
    classes: HashMap<u64, String>,
    next_class_id: u64,
    /// Published name -> number
    names: HashMap<String, DeviceNumber>,
    /// Published number -> (class id, name)
    published: HashMap<DeviceNumber, (u64, String)>,
    /// Routing table
    routes: HashMap<DeviceNumber, Arc<DeviceInstance>>,
    /// Bytes currently reserved for tables and buffers
    memory_used: usize,
}

/// Host environment kept entirely in process memory
///
/// Publishes devices in a flat name namespace, hands out majors from a
/// dynamic range and routes `open` calls to registered instances.
#[derive(Debug, Default)]
pub struct LocalHost {
    state: RwLock<LocalState>,
    limits: HostLimits,
    stats: HostStats,
}

impl LocalHost {
    /// Create a host with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host with custom limits
    pub fn with_limits(limits: HostLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Get the configured limits
    pub fn limits(&self) -> &HostLimits {
        &self.limits
    }

    /// Get call counters
    pub fn stats(&self) -> &HostStats {
        &self.stats
    }

    /// Open a session on the device published under `name`
    pub fn open(&self, name: &str) -> Result<Session> {
        let number = {
            let state = self.read_state();
            state.names.get(name).copied()
        };
        let number = number.ok_or_else(|| FifoDevError::unavailable(name))?;
        self.open_number(number)
    }

    /// Open a session on the device routed at `number`
    pub fn open_number(&self, number: DeviceNumber) -> Result<Session> {
        let instance = {
            let state = self.read_state();
            state.routes.get(&number).cloned()
        };
        let instance = instance.ok_or_else(|| FifoDevError::unavailable(number.to_string()))?;
        instance.open()
    }

    /// Names currently published, sorted
    pub fn published_names(&self) -> Vec<String> {
        let state = self.read_state();
        let mut names: Vec<String> = state.names.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number published under `name`
    pub fn lookup(&self, name: &str) -> Option<DeviceNumber> {
        self.read_state().names.get(name).copied()
    }

    /// Check whether calls to `number` are routed
    pub fn is_routed(&self, number: DeviceNumber) -> bool {
        self.read_state().routes.contains_key(&number)
    }

    /// Number of allocated identity blocks
    pub fn allocated_blocks(&self) -> usize {
        self.read_state().blocks.len()
    }

    /// Number of live classes
    pub fn class_count(&self) -> usize {
        self.read_state().classes.len()
    }

    /// Bytes reserved for tables and buffers
    pub fn memory_used(&self) -> usize {
        self.read_state().memory_used
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, LocalState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, LocalState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn charge(&self, what: &str, bytes: usize) -> Result<()> {
        let mut state = self.write_state();
        let total = state
            .memory_used
            .checked_add(bytes)
            .ok_or_else(|| FifoDevError::allocation(what, bytes))?;

        if let Some(budget) = self.limits.memory_budget {
            if total > budget {
                warn!(
                    "memory budget exceeded for {}: {} + {} > {}",
                    what, state.memory_used, bytes, budget
                );
                return Err(FifoDevError::allocation(what, bytes));
            }
        }

        state.memory_used = total;
        Ok(())
    }

    fn refund(&self, bytes: usize) {
        let mut state = self.write_state();
        state.memory_used = state.memory_used.saturating_sub(bytes);
    }

    fn table_bytes(devices: usize) -> usize {
        devices.saturating_mul(std::mem::size_of::<Arc<DeviceInstance>>())
    }
}

impl DeviceHost for LocalHost {
    fn reserve_table(&self, devices: usize) -> Result<()> {
        self.charge("device table", Self::table_bytes(devices))?;
        HostStats::bump(&self.stats.tables_reserved);
        Ok(())
    }

    fn release_table(&self, devices: usize) {
        self.refund(Self::table_bytes(devices));
        HostStats::bump(&self.stats.tables_released);
    }

    fn reserve_buffer(&self, index: usize, bytes: usize) -> Result<()> {
        self.charge(&format!("buffer {}", index), bytes)?;
        HostStats::bump(&self.stats.buffers_reserved);
        Ok(())
    }

    fn release_buffer(&self, _index: usize, bytes: usize) {
        self.refund(bytes);
        HostStats::bump(&self.stats.buffers_released);
    }

    fn alloc_identities(&self, count: u32, name: &str) -> Result<IdentityBlock> {
        if count == 0 || count > self.limits.max_minors {
            return Err(FifoDevError::identity_exhausted(count, self.limits.max_minors));
        }

        let mut state = self.write_state();
        let major = (self.limits.first_major..=self.limits.last_major)
            .rev()
            .find(|major| !state.blocks.contains_key(major))
            .ok_or_else(|| FifoDevError::identity_exhausted(count, 0))?;

        let block = IdentityBlock {
            first: DeviceNumber::new(major, 0),
            count,
            name: name.to_string(),
        };
        state.blocks.insert(major, block.clone());
        HostStats::bump(&self.stats.blocks_allocated);

        debug!("allocated identity block {} x{} for {}", block.first, count, name);
        Ok(block)
    }

    fn release_identities(&self, block: &IdentityBlock) {
        let mut state = self.write_state();
        if state.blocks.remove(&block.first.major).is_none() {
            warn!("releasing unknown identity block {}", block.first);
        }
        HostStats::bump(&self.stats.blocks_released);
    }

    fn create_class(&self, name: &str) -> Result<ClassHandle> {
        let mut state = self.write_state();
        if state.classes.values().any(|existing| existing == name) {
            return Err(FifoDevError::publication(name, "class already exists"));
        }

        state.next_class_id += 1;
        let id = state.next_class_id;
        state.classes.insert(id, name.to_string());
        HostStats::bump(&self.stats.classes_created);

        Ok(ClassHandle {
            id,
            name: name.to_string(),
        })
    }

    fn destroy_class(&self, class: &ClassHandle) {
        let mut state = self.write_state();
        if state.published.values().any(|(id, _)| *id == class.id) {
            warn!("destroying class {} with published devices", class.name);
        }
        state.classes.remove(&class.id);
        HostStats::bump(&self.stats.classes_destroyed);
    }

    fn publish(&self, class: &ClassHandle, number: DeviceNumber, name: &str) -> Result<()> {
        let mut state = self.write_state();

        if !state.classes.contains_key(&class.id) {
            return Err(FifoDevError::publication(name, "unknown class"));
        }
        let owned = state
            .blocks
            .get(&number.major)
            .map_or(false, |block| block.contains(number));
        if !owned {
            return Err(FifoDevError::publication(
                name,
                format!("number {} not allocated", number),
            ));
        }
        if state.names.contains_key(name) || state.published.contains_key(&number) {
            return Err(FifoDevError::publication(name, "already published"));
        }

        state.names.insert(name.to_string(), number);
        state.published.insert(number, (class.id, name.to_string()));
        HostStats::bump(&self.stats.publications);
        Ok(())
    }

    fn unpublish(&self, _class: &ClassHandle, number: DeviceNumber) {
        let mut state = self.write_state();
        if let Some((_, name)) = state.published.remove(&number) {
            state.names.remove(&name);
        }
        HostStats::bump(&self.stats.unpublications);
    }

    fn register_route(&self, number: DeviceNumber, instance: Arc<DeviceInstance>) -> Result<()> {
        let mut state = self.write_state();

        if !state.blocks.contains_key(&number.major) {
            return Err(FifoDevError::registration(
                instance.id(),
                format!("number {} not allocated", number),
            ));
        }
        if state.routes.contains_key(&number) {
            return Err(FifoDevError::registration(
                instance.id(),
                format!("number {} already routed", number),
            ));
        }

        state.routes.insert(number, instance);
        HostStats::bump(&self.stats.routes_registered);
        Ok(())
    }

    fn unregister_route(&self, number: DeviceNumber) {
        self.write_state().routes.remove(&number);
        HostStats::bump(&self.stats.routes_unregistered);
    }
}
