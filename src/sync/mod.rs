//! Background persistence for the in-memory planner state.
//!
//! The stores mark a shared [`DirtyHandle`] on every mutation; the
//! [`SyncScheduler`] watches the handle and flushes snapshots to the
//! repository, retrying on failure up to a configured limit.

mod error;
mod scheduler;

pub use error::SyncError;
pub use scheduler::{SyncScheduler, SyncStatus};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cloneable dirty flag shared between the stores and the scheduler.
///
/// Marking is cheap and synchronous so it can sit inside every store
/// mutation; the scheduler side awaits the flag asynchronously.
#[derive(Clone, Default)]
pub struct DirtyHandle {
    inner: Arc<DirtyInner>,
}

#[derive(Default)]
struct DirtyInner {
    dirty: AtomicBool,
    notify: Notify,
}

impl DirtyHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags unsaved state and wakes the scheduler.
    pub fn mark(&self) {
        self.inner.dirty.store(true, Ordering::Release);
        self.inner.notify.notify_one();
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::Acquire)
    }

    /// Clears the flag, returning whether it was set.
    pub(crate) fn clear(&self) -> bool {
        self.inner.dirty.swap(false, Ordering::AcqRel)
    }

    /// Resolves once the flag is set; returns immediately if already set.
    pub(crate) async fn wait_dirty(&self) {
        loop {
            if self.is_dirty() {
                return;
            }
            self.inner.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_clear() {
        let handle = DirtyHandle::new();
        assert!(!handle.is_dirty());

        handle.mark();
        assert!(handle.is_dirty());

        assert!(handle.clear());
        assert!(!handle.is_dirty());
        assert!(!handle.clear());
    }

    #[test]
    fn test_clones_share_state() {
        let handle = DirtyHandle::new();
        let clone = handle.clone();

        clone.mark();
        assert!(handle.is_dirty());
    }

    #[tokio::test]
    async fn test_wait_dirty_returns_when_marked() {
        let handle = DirtyHandle::new();
        handle.mark();
        // Must not hang when the flag is already set.
        handle.wait_dirty().await;
    }
}
