//! Bounded byte FIFO with wrap-around storage

use crate::{
    config::MAX_CAPACITY,
    error::{FifoDevError, Result},
};

use super::info::FifoInfo;

/// Bounded circular byte buffer
///
/// Writes are lossy on overflow: whatever does not fit in the free space is
/// dropped and the short count is returned. Reads never block and return an
/// empty result when nothing is buffered. The type itself is not
/// synchronized; device instances keep it behind a mutex.
#[derive(Debug, Clone)]
pub struct CircularBuffer {
    /// Backing storage, always exactly `capacity` bytes
    storage: Vec<u8>,
    /// Index of the oldest buffered byte
    head: usize,
    /// Number of buffered bytes
    len: usize,
}

impl CircularBuffer {
    /// Allocate a buffer with the given capacity
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        validate_capacity(capacity)?;

        Ok(Self {
            storage: allocate_storage(capacity)?,
            head: 0,
            len: 0,
        })
    }

    /// Get the capacity of the buffer
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Get the number of buffered bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if the buffer is full
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Get available space for writing
    pub fn available(&self) -> usize {
        self.capacity() - self.len
    }

    /// Append as many bytes as fit and return how many were written
    pub fn write(&mut self, data: &[u8]) -> usize {
        let count = data.len().min(self.available());
        if count == 0 {
            return 0;
        }

        let capacity = self.capacity();
        let tail = (self.head + self.len) % capacity;
        let first = count.min(capacity - tail);

        self.storage[tail..tail + first].copy_from_slice(&data[..first]);
        self.storage[..count - first].copy_from_slice(&data[first..count]);

        self.len += count;
        count
    }

    /// Remove up to `max` bytes in FIFO order
    pub fn read(&mut self, max: usize) -> Vec<u8> {
        let mut out = vec![0u8; max.min(self.len)];
        let count = self.read_into(&mut out);
        out.truncate(count);
        out
    }

    /// Remove up to `out.len()` bytes into `out`, returning the count
    pub fn read_into(&mut self, out: &mut [u8]) -> usize {
        let count = self.copy_out(out);
        self.consume(count);
        count
    }

    /// Copy up to `max` bytes without consuming them
    pub fn peek(&self, max: usize) -> Vec<u8> {
        let mut out = vec![0u8; max.min(self.len)];
        let count = self.copy_out(&mut out);
        out.truncate(count);
        out
    }

    /// Drop all buffered bytes. Storage is not zeroed.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Change the capacity, keeping the newest bytes
    ///
    /// When the new capacity is smaller than the current length the oldest
    /// `len - new_capacity` bytes are discarded. Order of the remaining bytes
    /// is preserved. Returns the number of discarded bytes. On error the
    /// buffer is left untouched.
    pub fn resize(&mut self, new_capacity: usize) -> Result<usize> {
        validate_capacity(new_capacity)?;
        let mut storage = allocate_storage(new_capacity)?;

        let discarded = self.len.saturating_sub(new_capacity);
        self.consume(discarded);

        let kept = self.copy_out(&mut storage);
        debug_assert_eq!(kept, self.len);

        self.storage = storage;
        self.head = 0;
        self.len = kept;
        Ok(discarded)
    }

    /// Snapshot of capacity, free space and length
    pub fn info(&self) -> FifoInfo {
        FifoInfo::from_counts(self.capacity(), self.len)
    }

    fn copy_out(&self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.len);
        if count == 0 {
            return 0;
        }

        let capacity = self.capacity();
        let first = count.min(capacity - self.head);

        out[..first].copy_from_slice(&self.storage[self.head..self.head + first]);
        out[first..count].copy_from_slice(&self.storage[..count - first]);
        count
    }

    fn consume(&mut self, count: usize) {
        debug_assert!(count <= self.len);
        self.len -= count;
        self.head = if self.len == 0 {
            0
        } else {
            (self.head + count) % self.capacity()
        };
    }
}

/// Check a requested capacity against the supported range
pub fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 || capacity > MAX_CAPACITY {
        return Err(FifoDevError::invalid_capacity(
            i64::try_from(capacity).unwrap_or(i64::MAX),
        ));
    }
    Ok(())
}

fn allocate_storage(capacity: usize) -> Result<Vec<u8>> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(capacity)
        .map_err(|_| FifoDevError::allocation("fifo storage", capacity))?;
    storage.resize(capacity, 0);
    Ok(storage)
}
