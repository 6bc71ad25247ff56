//! Tests for the in-process host

use std::sync::Arc;

use crate::{
    device::DeviceInstance,
    error::FifoDevError,
    fifo::CircularBuffer,
    host::{DeviceHost, DeviceNumber, HostLimits, IdentityBlock, LocalHost},
};

fn instance(id: usize) -> Arc<DeviceInstance> {
    let device = DeviceInstance::new(id, format!("dev{}", id), CircularBuffer::with_capacity(8).unwrap());
    device.activate();
    Arc::new(device)
}

#[test]
fn test_identity_block_numbers() {
    let block = IdentityBlock {
        first: DeviceNumber::new(240, 4),
        count: 3,
        name: "test".to_string(),
    };
    assert_eq!(block.number(0), Some(DeviceNumber::new(240, 4)));
    assert_eq!(block.number(2), Some(DeviceNumber::new(240, 6)));
    assert_eq!(block.number(3), None);
    assert!(block.contains(DeviceNumber::new(240, 5)));
    assert!(!block.contains(DeviceNumber::new(240, 7)));
    assert!(!block.contains(DeviceNumber::new(241, 5)));
    assert_eq!(DeviceNumber::new(240, 5).to_string(), "240:5");
}

#[test]
fn test_majors_allocated_top_down() {
    let host = LocalHost::with_limits(HostLimits::default().with_majors(250, 251));
    let a = host.alloc_identities(2, "a").unwrap();
    let b = host.alloc_identities(2, "b").unwrap();
    assert_eq!(a.first, DeviceNumber::new(251, 0));
    assert_eq!(b.first, DeviceNumber::new(250, 0));

    assert!(matches!(
        host.alloc_identities(1, "c"),
        Err(FifoDevError::IdentityExhausted { .. })
    ));

    host.release_identities(&a);
    assert_eq!(host.alloc_identities(1, "c").unwrap().first.major, 251);
}

#[test]
fn test_minor_limit() {
    let host = LocalHost::with_limits(HostLimits::default().with_max_minors(4));
    assert!(host.alloc_identities(4, "ok").is_ok());
    assert!(matches!(
        host.alloc_identities(5, "too_many"),
        Err(FifoDevError::IdentityExhausted {
            requested: 5,
            available: 4
        })
    ));
    assert!(host.alloc_identities(0, "none").is_err());
}

#[test]
fn test_publish_and_open() {
    let host = LocalHost::new();
    let block = host.alloc_identities(1, "dev").unwrap();
    let class = host.create_class("dev_class").unwrap();
    let number = block.number(0).unwrap();

    host.publish(&class, number, "dev0").unwrap();
    assert_eq!(host.lookup("dev0"), Some(number));
    assert!(host.open("dev0").is_err());

    let device = instance(0);
    host.register_route(number, Arc::clone(&device)).unwrap();
    assert!(host.is_routed(number));

    let session = host.open("dev0").unwrap();
    session.write(b"hi").unwrap();
    assert_eq!(device.read(2).unwrap(), b"hi");

    assert!(matches!(
        host.open("missing"),
        Err(FifoDevError::DeviceUnavailable { .. })
    ));
}

#[test]
fn test_publication_conflicts() {
    let host = LocalHost::new();
    let block = host.alloc_identities(2, "dev").unwrap();
    let class = host.create_class("dev_class").unwrap();

    assert!(matches!(
        host.create_class("dev_class"),
        Err(FifoDevError::PublicationFailure { .. })
    ));

    host.publish(&class, block.number(0).unwrap(), "dev0").unwrap();
    assert!(host.publish(&class, block.number(1).unwrap(), "dev0").is_err());
    assert!(host.publish(&class, block.number(0).unwrap(), "dev1").is_err());
    assert!(host
        .publish(&class, DeviceNumber::new(1, 0), "stray")
        .is_err());

    host.unpublish(&class, block.number(0).unwrap());
    assert!(host.published_names().is_empty());
    assert_eq!(host.stats().live_publications(), 0);
}

#[test]
fn test_route_conflicts() {
    let host = LocalHost::new();
    let block = host.alloc_identities(1, "dev").unwrap();
    let number = block.number(0).unwrap();

    host.register_route(number, instance(0)).unwrap();
    assert!(matches!(
        host.register_route(number, instance(1)),
        Err(FifoDevError::RegistrationFailure { index: 1, .. })
    ));
    assert!(host
        .register_route(DeviceNumber::new(7, 0), instance(2))
        .is_err());

    host.unregister_route(number);
    assert!(!host.is_routed(number));
}

#[test]
fn test_memory_budget() {
    let table = std::mem::size_of::<Arc<DeviceInstance>>();
    let host = LocalHost::with_limits(HostLimits::default().with_memory_budget(table + 64));

    host.reserve_table(1).unwrap();
    host.reserve_buffer(0, 64).unwrap();
    assert!(matches!(
        host.reserve_buffer(1, 1),
        Err(FifoDevError::AllocationFailure { .. })
    ));
    assert_eq!(host.memory_used(), table + 64);

    host.release_buffer(0, 64);
    host.release_table(1);
    assert_eq!(host.memory_used(), 0);
}
