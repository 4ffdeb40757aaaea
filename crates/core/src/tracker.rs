//! Acquisition/release accounting for archive handles and execution contexts.
//!
//! Every [`crate::archive::ArchiveHandle`] and every JVM execution context
//! holds a [`ResourceGuard`] for its lifetime. The guard decrements the live
//! count on drop, so a tracker reporting `live() == 0` after a pass proves
//! nothing was left open, failure paths included.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// Shared, cheaply cloneable resource counter.
#[derive(Debug, Clone, Default)]
pub struct ResourceTracker {
    archives: Arc<Counters>,
    contexts: Arc<Counters>,
}

/// What a guard is accounting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Archive,
    ExecutionContext,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn acquire(&self, kind: ResourceKind) -> ResourceGuard {
        let counters = self.counters(kind).clone();
        counters.acquired.fetch_add(1, Ordering::SeqCst);
        ResourceGuard { counters }
    }

    fn counters(&self, kind: ResourceKind) -> &Arc<Counters> {
        match kind {
            ResourceKind::Archive => &self.archives,
            ResourceKind::ExecutionContext => &self.contexts,
        }
    }

    /// Total number of resources of `kind` ever acquired through this tracker.
    pub fn acquired(&self, kind: ResourceKind) -> usize {
        self.counters(kind).acquired.load(Ordering::SeqCst)
    }

    /// Number of resources of `kind` currently held.
    pub fn live(&self, kind: ResourceKind) -> usize {
        let c = self.counters(kind);
        c.acquired.load(Ordering::SeqCst) - c.released.load(Ordering::SeqCst)
    }

    pub fn all_released(&self) -> bool {
        self.live(ResourceKind::Archive) == 0 && self.live(ResourceKind::ExecutionContext) == 0
    }
}

/// Releases its slot when dropped.
#[derive(Debug)]
pub struct ResourceGuard {
    counters: Arc<Counters>,
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}
