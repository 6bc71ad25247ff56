//! Device registry: staged bring-up, rollback and teardown

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::{
    device::{DeviceInstance, Session},
    error::{FifoDevError, Result},
    fifo::CircularBuffer,
    host::{ClassHandle, DeviceHost, DeviceNumber, IdentityBlock},
};

use super::{
    config::RegistryConfig,
    rollback::{Release, RollbackStack},
    stage::{RegistryState, Stage},
};

/// Owner of all device instances of one host
///
/// `bring_up` runs the stages in order and records a release step for every
/// acquire that succeeds. If a stage fails the recorded steps are unwound
/// before the error is returned, so either every instance is live or nothing
/// is left behind on the host. `tear_down` unwinds the same steps.
#[derive(Debug)]
pub struct DeviceRegistry<H: DeviceHost> {
    host: Arc<H>,
    config: RegistryConfig,
    state: RegistryState,
    table: Vec<Arc<DeviceInstance>>,
    block: Option<IdentityBlock>,
    class: Option<ClassHandle>,
    rollback: RollbackStack,
}

impl<H: DeviceHost> DeviceRegistry<H> {
    /// Create an uninitialized registry
    pub fn new(host: Arc<H>, config: RegistryConfig) -> Self {
        Self {
            host,
            config,
            state: RegistryState::Uninitialized,
            table: Vec::new(),
            block: None,
            class: None,
            rollback: RollbackStack::new(),
        }
    }

    /// Create a registry and bring it up
    pub fn start(host: Arc<H>, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::new(host, config);
        registry.bring_up()?;
        Ok(registry)
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Identity block held while live
    pub fn identity_block(&self) -> Option<&IdentityBlock> {
        self.block.as_ref()
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        if self.state == RegistryState::Live {
            self.table.len()
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live instances in index order
    pub fn instances(&self) -> &[Arc<DeviceInstance>] {
        if self.state == RegistryState::Live {
            &self.table
        } else {
            &[]
        }
    }

    /// Look up a live instance
    pub fn instance(&self, id: usize) -> Result<Arc<DeviceInstance>> {
        self.instances()
            .get(id)
            .cloned()
            .ok_or_else(|| FifoDevError::unavailable(self.config.device_name(id)))
    }

    /// Open a session on instance `id`
    pub fn open(&self, id: usize) -> Result<Session> {
        self.instance(id)?.open()
    }

    /// Bring every instance up, or none
    pub fn bring_up(&mut self) -> Result<()> {
        if self.state != RegistryState::Uninitialized {
            return Err(FifoDevError::invalid_parameter(
                "state",
                format!("cannot bring up a registry that is {}", self.state),
            ));
        }

        self.config.validate()?;
        info!(
            "bringing up {} devices ({} bytes each)",
            self.config.devices, self.config.default_capacity
        );

        match self.run_stages() {
            Ok(()) => {
                for instance in &self.table {
                    instance.activate();
                }
                self.state = RegistryState::Live;
                info!("{} devices live", self.table.len());
                Ok(())
            }
            Err(err) => {
                error!("bring-up failed in {}: {}", self.stage_name(), err);
                self.state = RegistryState::RollingBack;
                self.unwind();
                self.state = RegistryState::Uninitialized;
                Err(err)
            }
        }
    }

    /// Quiesce every instance and release everything bring-up acquired
    pub fn tear_down(&mut self) -> Result<()> {
        if self.state != RegistryState::Live {
            return Err(FifoDevError::invalid_parameter(
                "state",
                format!("cannot tear down a registry that is {}", self.state),
            ));
        }

        info!("tearing down {} devices", self.table.len());
        self.state = RegistryState::TearingDown;
        self.unwind();
        self.state = RegistryState::Uninitialized;
        info!("teardown complete");
        Ok(())
    }

    fn stage_name(&self) -> String {
        match self.state {
            RegistryState::BringingUp(stage) => stage.to_string(),
            other => other.to_string(),
        }
    }

    fn enter(&mut self, stage: Stage) {
        debug!("entering stage {}", stage);
        self.state = RegistryState::BringingUp(stage);
    }

    fn run_stages(&mut self) -> Result<()> {
        let devices = self.config.device_count()?;

        self.alloc_table(devices)?;
        self.alloc_buffers(devices)?;
        self.alloc_identities(devices)?;
        self.publish_all()?;
        self.register_all()
    }

    fn alloc_table(&mut self, devices: usize) -> Result<()> {
        self.enter(Stage::Table);
        self.host.reserve_table(devices)?;

        let mut table = Vec::new();
        if table.try_reserve_exact(devices).is_err() {
            self.host.release_table(devices);
            return Err(FifoDevError::allocation(
                "device table",
                devices.saturating_mul(std::mem::size_of::<Arc<DeviceInstance>>()),
            ));
        }

        self.table = table;
        self.rollback.push(Release::Table { devices });
        debug!("allocated table for {} devices", devices);
        Ok(())
    }

    fn alloc_buffers(&mut self, devices: usize) -> Result<()> {
        self.enter(Stage::Buffers);
        let capacity = self.config.default_capacity;

        for index in 0..devices {
            self.host.reserve_buffer(index, capacity)?;

            let fifo = match CircularBuffer::with_capacity(capacity) {
                Ok(fifo) => fifo,
                Err(err) => {
                    self.host.release_buffer(index, capacity);
                    return Err(err);
                }
            };

            let name = self.config.device_name(index);
            self.table
                .push(Arc::new(DeviceInstance::new(index, name, fifo)));
            self.rollback.push(Release::Buffer { index });
        }

        debug!("allocated {} buffers", devices);
        Ok(())
    }

    fn alloc_identities(&mut self, devices: usize) -> Result<()> {
        self.enter(Stage::Identities);
        let count = u32::try_from(devices)
            .map_err(|_| FifoDevError::identity_exhausted(u32::MAX, 0))?;

        let block = self.host.alloc_identities(count, &self.config.name_prefix)?;
        info!("allocated device numbers {} (x{})", block.first, block.count);

        self.block = Some(block);
        self.rollback.push(Release::Identities);
        Ok(())
    }

    fn publish_all(&mut self) -> Result<()> {
        self.enter(Stage::Publication);

        let class = self.host.create_class(&self.config.class_name)?;
        debug!("created class {}", class.name);
        self.class = Some(class.clone());
        self.rollback.push(Release::Class);

        for index in 0..self.table.len() {
            let number = self.number_of(index)?;
            let instance = Arc::clone(&self.table[index]);

            self.host.publish(&class, number, instance.name())?;
            self.rollback.push(Release::Publication { index, number });
        }

        debug!("published {} devices", self.table.len());
        Ok(())
    }

    fn register_all(&mut self) -> Result<()> {
        self.enter(Stage::Routing);

        for index in 0..self.table.len() {
            let number = self.number_of(index)?;
            let instance = Arc::clone(&self.table[index]);

            instance.assign_number(number)?;
            self.host.register_route(number, instance)?;
            self.rollback.push(Release::Route { index, number });
        }

        debug!("registered {} devices for routing", self.table.len());
        Ok(())
    }

    fn number_of(&self, index: usize) -> Result<DeviceNumber> {
        self.block
            .as_ref()
            .and_then(|block| block.number(index))
            .ok_or_else(|| {
                let requested = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
                FifoDevError::identity_exhausted(requested, 0)
            })
    }

    /// Retire all instances, then pop and run every recorded release step
    fn unwind(&mut self) {
        for instance in &self.table {
            instance.retire();
        }

        let steps = self.rollback.len();
        while let Some(step) = self.rollback.pop() {
            self.release(step);
        }
        debug!("released {} steps", steps);
    }

    fn release(&mut self, step: Release) {
        debug!("releasing {:?}", step);

        match step {
            Release::Route { number, .. } => {
                self.host.unregister_route(number);
            }
            Release::Publication { index, number } => match &self.class {
                Some(class) => self.host.unpublish(class, number),
                None => warn!("no class while unpublishing device {}", index),
            },
            Release::Class => {
                if let Some(class) = self.class.take() {
                    self.host.destroy_class(&class);
                }
            }
            Release::Identities => {
                if let Some(block) = self.block.take() {
                    self.host.release_identities(&block);
                }
            }
            Release::Buffer { index } => {
                match self.table.pop() {
                    Some(instance) => {
                        debug_assert_eq!(instance.id(), index);
                        instance.free_buffer();
                    }
                    None => warn!("no instance while freeing buffer {}", index),
                }
                self.host.release_buffer(index, self.config.default_capacity);
            }
            Release::Table { devices } => {
                self.table = Vec::new();
                self.host.release_table(devices);
            }
        }
    }
}

impl<H: DeviceHost> Drop for DeviceRegistry<H> {
    fn drop(&mut self) {
        if self.state == RegistryState::Live {
            if let Err(err) = self.tear_down() {
                error!("teardown on drop failed: {}", err);
            }
        }
    }
}
