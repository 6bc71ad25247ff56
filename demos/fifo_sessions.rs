//! Several sessions sharing devices, raw control requests and a failed bring-up

use fifodev::{
    DeviceHost, DeviceRegistry, FifoInfo, LocalHost, RegistryConfig, Result, FIFO_INFO,
    FIFO_RESIZE,
};
use std::{sync::Arc, thread};

fn main() -> Result<()> {
    env_logger::init();

    let host = Arc::new(LocalHost::new());
    let registry = Arc::new(DeviceRegistry::start(
        host.clone(),
        RegistryConfig::new(3).with_capacity(256),
    )?);

    // One producer and one consumer per device
    let mut handles = Vec::new();
    for id in 0..registry.len() {
        let registry = registry.clone();
        handles.push(thread::spawn(move || -> Result<usize> {
            let producer = registry.open(id)?;
            let consumer = registry.open(id)?;
            let mut received = 0;
            for round in 0..50u8 {
                producer.write(&[round; 16])?;
                received += consumer.read(16)?.len();
            }
            Ok(received)
        }));
    }

    for (id, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(received)) => println!("fifodev{} moved {} bytes", id, received),
            Ok(Err(err)) => println!("fifodev{} failed: {}", id, err),
            Err(_) => println!("fifodev{} worker panicked", id),
        }
    }

    // Raw request codes, as a host speaking ioctl would issue them
    let session = host.open("fifodev2")?;
    session.write(b"raw control path")?;

    let mut arg = (8 as std::os::raw::c_long).to_ne_bytes();
    session.ioctl(FIFO_RESIZE, &mut arg)?;

    let mut info = [0u8; FifoInfo::SIZE];
    session.ioctl(FIFO_INFO, &mut info)?;
    println!("after FIFO_RESIZE(8): {:?}", FifoInfo::from_bytes(&info)?);
    println!("kept: {}", String::from_utf8_lossy(&session.read(8)?));
    drop(session);

    // A second set of devices whose names are taken rolls back completely
    let taken = host.alloc_identities(1, "squatter")?;
    let class = host.create_class("squatter_class")?;
    host.publish(&class, taken.first, "late1")?;

    let mut late = DeviceRegistry::new(
        host.clone(),
        RegistryConfig::new(2)
            .with_name_prefix("late")
            .with_class_name("late_class"),
    );
    match late.bring_up() {
        Ok(()) => println!("unexpected bring-up"),
        Err(err) => println!("bring-up failed as expected: {}", err),
    }
    println!("published now: {:?}", host.published_names());

    host.unpublish(&class, taken.first);
    host.destroy_class(&class);
    host.release_identities(&taken);

    Ok(())
}
