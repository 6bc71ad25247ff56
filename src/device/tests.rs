//! Tests for device instances and sessions

use std::{
    sync::{atomic::Ordering, Arc, Barrier},
    thread,
};

use crate::{
    control::{ControlCommand, FIFO_CLEAR, FIFO_INFO, FIFO_RESIZE},
    device::{DeviceInstance, DeviceState},
    error::FifoDevError,
    fifo::{CircularBuffer, FifoInfo},
    host::DeviceNumber,
};

fn device(capacity: usize) -> Arc<DeviceInstance> {
    let device = Arc::new(DeviceInstance::new(
        0,
        "fifodev0",
        CircularBuffer::with_capacity(capacity).unwrap(),
    ));
    device.activate();
    device
}

#[test]
fn test_pending_device_refuses_calls() {
    let device = Arc::new(DeviceInstance::new(
        3,
        "fifodev3",
        CircularBuffer::with_capacity(8).unwrap(),
    ));
    assert_eq!(device.state(), DeviceState::Pending);
    assert!(matches!(device.open(), Err(FifoDevError::DeviceUnavailable { .. })));
    assert!(device.write(b"x").is_err());

    device.activate();
    assert_eq!(device.state(), DeviceState::Live);
    assert!(device.open().is_ok());
}

#[test]
fn test_number_assigned_once() {
    let device = device(8);
    assert_eq!(device.number(), None);
    device.assign_number(DeviceNumber::new(250, 0)).unwrap();
    assert!(device.assign_number(DeviceNumber::new(250, 1)).is_err());
    assert_eq!(device.number(), Some(DeviceNumber::new(250, 0)));
}

#[test]
fn test_session_counts() {
    let device = device(8);
    let a = device.open().unwrap();
    let b = device.open().unwrap();
    assert_ne!(a.id(), b.id());
    assert_eq!(device.stats().sessions(), 2);

    a.close();
    assert_eq!(device.stats().sessions(), 1);
    drop(b);
    assert_eq!(device.stats().sessions(), 0);
    assert_eq!(device.stats().closes.load(Ordering::Relaxed), 2);
}

#[test]
fn test_sessions_share_one_fifo() {
    let device = device(32);
    let writer = device.open().unwrap();
    let reader = device.open().unwrap();

    assert_eq!(writer.write(b"shared").unwrap(), 6);
    assert_eq!(reader.read(3).unwrap(), b"sha");
    assert_eq!(writer.read(10).unwrap(), b"red");
    assert!(reader.read(10).unwrap().is_empty());
}

#[test]
fn test_write_overflow_is_counted() {
    let device = device(4);
    assert_eq!(device.write(b"abcdef").unwrap(), 4);
    assert_eq!(device.stats().bytes_written.load(Ordering::Relaxed), 4);
    assert_eq!(device.stats().bytes_dropped.load(Ordering::Relaxed), 2);

    let mut out = [0u8; 8];
    assert_eq!(device.read_into(&mut out).unwrap(), 4);
    assert_eq!(&out[..4], b"abcd");
    assert_eq!(device.stats().bytes_read.load(Ordering::Relaxed), 4);
}

#[test]
fn test_raw_ioctl() {
    let device = device(32);
    let session = device.open().unwrap();
    session.write(&[b'A'; 12]).unwrap();

    let mut info = ControlCommand::Info.encode_arg().unwrap();
    session.ioctl(FIFO_INFO, &mut info).unwrap();
    assert_eq!(
        FifoInfo::from_bytes(&info).unwrap(),
        FifoInfo {
            capacity: 32,
            available: 20,
            length: 12
        }
    );

    let mut resize = ControlCommand::Resize(64).encode_arg().unwrap();
    session.ioctl(FIFO_RESIZE, &mut resize).unwrap();
    session.ioctl(FIFO_CLEAR, &mut []).unwrap();

    let mut info = [0u8; FifoInfo::SIZE];
    session.ioctl(FIFO_INFO, &mut info).unwrap();
    assert_eq!(
        FifoInfo::from_bytes(&info).unwrap(),
        FifoInfo {
            capacity: 64,
            available: 64,
            length: 0
        }
    );

    assert!(matches!(
        session.ioctl(0x1234, &mut []),
        Err(FifoDevError::UnsupportedCommand { .. })
    ));
}

#[test]
fn test_retired_device_frees_buffer() {
    let device = device(16);
    let session = device.open().unwrap();
    device.retire();
    assert_eq!(device.free_buffer(), 16);
    assert_eq!(device.free_buffer(), 0);
    assert!(matches!(
        session.write(b"late"),
        Err(FifoDevError::DeviceUnavailable { .. })
    ));
}

#[test]
fn test_concurrent_writers_keep_invariants() {
    let capacity = 1024;
    let device = device(capacity);
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let device = Arc::clone(&device);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let session = device.open().unwrap();
                barrier.wait();
                let mut written = 0;
                for _ in 0..100 {
                    written += session.write(&[t as u8; 7]).unwrap();
                    let info = device.info().unwrap();
                    assert_eq!(info.available + info.length, info.capacity);
                }
                written
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    // 5600 bytes offered, the FIFO accepts exactly its capacity
    assert_eq!(total, capacity);
    assert_eq!(device.info().unwrap().length as usize, total);
}

#[test]
fn test_concurrent_readers_never_duplicate_bytes() {
    let device = device(4096);
    let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(device.write(&data).unwrap(), 4096);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let device = Arc::clone(&device);
            thread::spawn(move || {
                let mut got = 0usize;
                loop {
                    let chunk = device.read(13).unwrap();
                    if chunk.is_empty() {
                        break got;
                    }
                    got += chunk.len();
                }
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 4096);
    assert_eq!(device.info().unwrap().length, 0);
}
