#!/usr/bin/env rust

//! Basic usage example of the fifodev pseudo-devices

use fifodev::{ControlCommand, ControlReply, DeviceRegistry, LocalHost, RegistryConfig, Result};
use std::sync::Arc;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    println!("fifodev Example");
    println!("===============");

    // In-process host standing in for the device namespace
    let host = Arc::new(LocalHost::new());

    let config = RegistryConfig::new(2).with_capacity(32);
    println!("Bringing up {} devices of {} bytes", config.devices, config.default_capacity);
    let mut registry = DeviceRegistry::start(host.clone(), config)?;

    println!("Registry is {}", registry.state());
    for instance in registry.instances() {
        if let Some(number) = instance.number() {
            println!("  {} -> {}", instance.name(), number);
        }
    }

    // Open the first device by name, the way a user would
    let session = host.open("fifodev0")?;

    let mut payload = vec![b'A'; 32];
    payload.extend_from_slice(&[b'B'; 8]);
    let written = session.write(&payload)?;
    println!("\nWrote {} of {} bytes (short write)", written, payload.len());

    if let ControlReply::Info(info) = session.control(ControlCommand::Info)? {
        println!(
            "  capacity={} available={} length={}",
            info.capacity, info.available, info.length
        );
    }

    let data = session.read(10)?;
    println!("Read {} bytes: {}", data.len(), String::from_utf8_lossy(&data));

    // Grow the FIFO; pending bytes are kept
    session.control(ControlCommand::Resize(64))?;
    println!("Resized to 64 bytes, {:?}", session.device().info()?);

    // A non-positive size is rejected and the FIFO is unchanged
    if let Err(err) = session.control(ControlCommand::Resize(0)) {
        println!("Resize(0) rejected: {} (errno {})", err, err.errno());
    }

    session.control(ControlCommand::Clear)?;
    println!("Cleared, {:?}", session.device().info()?);

    session.close();
    registry.tear_down()?;

    println!("\nTeardown complete, host balanced: {}", host.stats().is_balanced());
    Ok(())
}
