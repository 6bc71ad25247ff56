//! Call counters for the in-process host

use std::sync::atomic::{AtomicUsize, Ordering};

/// Host-side counters, one pair per acquire/release service
#[derive(Debug, Default)]
pub struct HostStats {
    pub tables_reserved: AtomicUsize,
    pub tables_released: AtomicUsize,
    pub buffers_reserved: AtomicUsize,
    pub buffers_released: AtomicUsize,
    pub blocks_allocated: AtomicUsize,
    pub blocks_released: AtomicUsize,
    pub classes_created: AtomicUsize,
    pub classes_destroyed: AtomicUsize,
    pub publications: AtomicUsize,
    pub unpublications: AtomicUsize,
    pub routes_registered: AtomicUsize,
    pub routes_unregistered: AtomicUsize,
}

impl HostStats {
    pub(crate) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Published devices not yet removed
    pub fn live_publications(&self) -> usize {
        let published = self.publications.load(Ordering::Relaxed);
        let removed = self.unpublications.load(Ordering::Relaxed);
        published.saturating_sub(removed)
    }

    /// Routes not yet unregistered
    pub fn live_routes(&self) -> usize {
        let registered = self.routes_registered.load(Ordering::Relaxed);
        let removed = self.routes_unregistered.load(Ordering::Relaxed);
        registered.saturating_sub(removed)
    }

    /// Buffer reservations not yet released
    pub fn live_buffers(&self) -> usize {
        let reserved = self.buffers_reserved.load(Ordering::Relaxed);
        let released = self.buffers_released.load(Ordering::Relaxed);
        reserved.saturating_sub(released)
    }

    /// True when every acquire has been matched by a release
    pub fn is_balanced(&self) -> bool {
        let pairs = [
            (&self.tables_reserved, &self.tables_released),
            (&self.buffers_reserved, &self.buffers_released),
            (&self.blocks_allocated, &self.blocks_released),
            (&self.classes_created, &self.classes_destroyed),
            (&self.publications, &self.unpublications),
            (&self.routes_registered, &self.routes_unregistered),
        ];
        pairs
            .iter()
            .all(|(a, r)| a.load(Ordering::Relaxed) == r.load(Ordering::Relaxed))
    }
}
