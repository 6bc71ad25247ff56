//! Per-device statistics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters kept by every device instance
#[derive(Debug, Default)]
pub struct DeviceStats {
    /// Sessions opened
    pub opens: AtomicU64,
    /// Sessions closed
    pub closes: AtomicU64,
    /// Sessions currently open
    pub active_sessions: AtomicUsize,
    /// Bytes accepted by writes
    pub bytes_written: AtomicU64,
    /// Bytes refused by writes because the FIFO was full
    pub bytes_dropped: AtomicU64,
    /// Bytes returned by reads
    pub bytes_read: AtomicU64,
    /// Bytes discarded by shrinking resizes
    pub bytes_discarded: AtomicU64,
    /// Control commands executed
    pub control_commands: AtomicU64,
    /// Control commands that failed
    pub control_errors: AtomicU64,
}

impl DeviceStats {
    /// Record a session open, returning the number of open sessions
    pub fn record_open(&self) -> usize {
        self.opens.fetch_add(1, Ordering::Relaxed);
        self.active_sessions.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a session close
    pub fn record_close(&self) {
        self.closes.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .active_sessions
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Record a write of `requested` bytes of which `written` fit
    pub fn record_write(&self, requested: usize, written: usize) {
        self.bytes_written.fetch_add(written as u64, Ordering::Relaxed);
        self.bytes_dropped
            .fetch_add(requested.saturating_sub(written) as u64, Ordering::Relaxed);
    }

    /// Record a read
    pub fn record_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a control command outcome
    pub fn record_control(&self, ok: bool) {
        self.control_commands.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.control_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record bytes discarded by a resize
    pub fn record_discarded(&self, count: usize) {
        self.bytes_discarded.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Number of open sessions
    pub fn sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }
}
