//! Registry lifecycle tests against the in-process host
//! Bring-up, end-to-end device traffic, rollback on host failures and teardown

use std::sync::{atomic::Ordering, Arc};

use fifodev::{
    ControlCommand, ControlReply, DeviceHost, DeviceRegistry, FifoDevError, FifoInfo, HostLimits,
    LocalHost, RegistryConfig, RegistryState,
};

#[cfg(test)]
mod registry_lifecycle_tests {
    use super::*;

    fn info(capacity: i16, available: i16, length: i16) -> FifoInfo {
        FifoInfo {
            capacity,
            available,
            length,
        }
    }

    /// Test: two devices, 40 bytes into a 32-byte FIFO, then a partial read
    #[test]
    fn lifecycle_end_to_end_short_write_and_read() {
        let host = Arc::new(LocalHost::new());
        let registry =
            DeviceRegistry::start(host.clone(), RegistryConfig::new(2).with_capacity(32)).unwrap();

        assert_eq!(host.published_names(), vec!["fifodev0", "fifodev1"]);

        let session = host.open("fifodev0").unwrap();
        let mut payload = vec![b'A'; 32];
        payload.extend_from_slice(&[b'B'; 8]);

        assert_eq!(session.write(&payload).unwrap(), 32);
        assert_eq!(
            session.control(ControlCommand::Info).unwrap(),
            ControlReply::Info(info(32, 0, 32))
        );

        assert_eq!(session.read(10).unwrap(), vec![b'A'; 10]);
        assert_eq!(
            session.control(ControlCommand::Info).unwrap(),
            ControlReply::Info(info(32, 10, 22))
        );

        // the other device is independent
        let other = registry.open(1).unwrap();
        assert!(other.read(10).unwrap().is_empty());
        assert_eq!(other.device().info().unwrap(), info(32, 32, 0));
    }

    /// Test: publication of instance 1 collides with a name owned by someone else
    #[test]
    fn lifecycle_publication_failure_rolls_back() {
        let host = Arc::new(LocalHost::new());

        // another driver already owns "fifodev1"
        let foreign_block = host.alloc_identities(1, "foreign").unwrap();
        let foreign_class = host.create_class("foreign_class").unwrap();
        host.publish(&foreign_class, foreign_block.first, "fifodev1")
            .unwrap();

        let mut registry = DeviceRegistry::new(host.clone(), RegistryConfig::new(3));
        let err = registry.bring_up().unwrap_err();
        assert!(matches!(err, FifoDevError::PublicationFailure { ref name, .. } if name == "fifodev1"));
        assert_eq!(registry.state(), RegistryState::Uninitialized);

        let stats = host.stats();
        assert_eq!(stats.publications.load(Ordering::Relaxed), 2); // foreign + fifodev0
        assert_eq!(stats.unpublications.load(Ordering::Relaxed), 1);
        assert_eq!(stats.routes_registered.load(Ordering::Relaxed), 0);
        assert_eq!(stats.buffers_reserved.load(Ordering::Relaxed), 3);
        assert_eq!(stats.buffers_released.load(Ordering::Relaxed), 3);
        assert_eq!(stats.blocks_released.load(Ordering::Relaxed), 1);

        // only the foreign driver's resources remain
        assert_eq!(host.published_names(), vec!["fifodev1"]);
        assert_eq!(host.allocated_blocks(), 1);
        assert_eq!(host.class_count(), 1);
        assert_eq!(host.memory_used(), 0);
    }

    /// Test: identity exhaustion leaves only buffers and table to undo
    #[test]
    fn lifecycle_identity_exhaustion() {
        let host = Arc::new(LocalHost::with_limits(
            HostLimits::default().with_max_minors(2),
        ));
        let mut registry = DeviceRegistry::new(host.clone(), RegistryConfig::new(3));

        assert!(matches!(
            registry.bring_up(),
            Err(FifoDevError::IdentityExhausted {
                requested: 3,
                available: 2
            })
        ));
        assert!(host.stats().is_balanced());
        assert_eq!(host.stats().classes_created.load(Ordering::Relaxed), 0);
        assert_eq!(host.memory_used(), 0);
    }

    /// Test: memory budget runs out on the third buffer
    #[test]
    fn lifecycle_buffer_allocation_failure() {
        let table = 3 * std::mem::size_of::<Arc<fifodev::DeviceInstance>>();
        let host = Arc::new(LocalHost::with_limits(
            HostLimits::default().with_memory_budget(table + 2 * 32),
        ));
        let mut registry = DeviceRegistry::new(host.clone(), RegistryConfig::new(3));

        assert!(matches!(
            registry.bring_up(),
            Err(FifoDevError::AllocationFailure { .. })
        ));
        let stats = host.stats();
        assert_eq!(stats.buffers_reserved.load(Ordering::Relaxed), 2);
        assert_eq!(stats.buffers_released.load(Ordering::Relaxed), 2);
        assert_eq!(stats.blocks_allocated.load(Ordering::Relaxed), 0);
        assert!(stats.is_balanced());
    }

    /// Test: a second registry with the same class name fails and leaves the first intact
    #[test]
    fn lifecycle_second_registry_class_conflict() {
        let host = Arc::new(LocalHost::new());
        let first = DeviceRegistry::start(host.clone(), RegistryConfig::new(2)).unwrap();

        let second = DeviceRegistry::start(
            host.clone(),
            RegistryConfig::new(2).with_name_prefix("other"),
        );
        assert!(matches!(second, Err(FifoDevError::PublicationFailure { .. })));

        assert_eq!(first.len(), 2);
        assert_eq!(host.published_names(), vec!["fifodev0", "fifodev1"]);
        assert!(host.open("fifodev1").is_ok());

        let third = DeviceRegistry::start(
            host.clone(),
            RegistryConfig::new(1)
                .with_name_prefix("other")
                .with_class_name("other_class"),
        )
        .unwrap();
        assert_ne!(
            third.identity_block().unwrap().first.major,
            first.identity_block().unwrap().first.major
        );
        assert!(host.open("other0").is_ok());
    }

    /// Test: teardown releases everything and refuses further calls
    #[test]
    fn lifecycle_teardown_releases_host_resources() {
        let host = Arc::new(LocalHost::new());
        let mut registry = DeviceRegistry::start(host.clone(), RegistryConfig::new(4)).unwrap();

        let session = host.open("fifodev3").unwrap();
        session.write(b"pending").unwrap();
        let number = registry.instance(3).unwrap().number().unwrap();
        assert!(host.is_routed(number));

        registry.tear_down().unwrap();

        assert!(host.published_names().is_empty());
        assert!(!host.is_routed(number));
        assert_eq!(host.allocated_blocks(), 0);
        assert_eq!(host.class_count(), 0);
        assert_eq!(host.memory_used(), 0);
        assert!(host.stats().is_balanced());

        assert!(matches!(
            session.read(7),
            Err(FifoDevError::DeviceUnavailable { .. })
        ));
        assert!(host.open("fifodev3").is_err());

        // the same registry can come back up
        registry.bring_up().unwrap();
        assert!(host.open("fifodev3").unwrap().read(7).unwrap().is_empty());
    }

    /// Test: raw ioctl path through a host-routed session
    #[test]
    fn lifecycle_raw_ioctl_resize() {
        let host = Arc::new(LocalHost::new());
        let _registry = DeviceRegistry::start(host.clone(), RegistryConfig::default()).unwrap();
        let session = host.open("fifodev0").unwrap();

        session.write(b"0123456789").unwrap();

        let mut arg = ControlCommand::Resize(4).encode_arg().unwrap();
        session.ioctl(fifodev::FIFO_RESIZE, &mut arg).unwrap();

        let mut arg = ControlCommand::Info.encode_arg().unwrap();
        session.ioctl(fifodev::FIFO_INFO, &mut arg).unwrap();
        assert_eq!(FifoInfo::from_bytes(&arg).unwrap(), info(4, 0, 4));
        assert_eq!(session.read(4).unwrap(), b"6789");

        let mut arg = ControlCommand::Resize(0).encode_arg().unwrap();
        let err = session.ioctl(fifodev::FIFO_RESIZE, &mut arg).unwrap_err();
        assert_eq!(err.errno(), nix::errno::Errno::EINVAL);
    }
}
