//! Per-event critical sections
//!
//! Every read-decide-write sequence on an event's confirmed counter or state
//! runs while holding that event's lock. Locks are process-local: admissions
//! for one event must be handled by a single running instance.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

type LockMap = DashMap<i64, Arc<Mutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct EventLocks {
    locks: Arc<LockMap>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `event_id`; released when the guard drops
    pub async fn lock(&self, event_id: i64) -> EventLockGuard {
        let mutex = self
            .locks
            .entry(event_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.clone().lock_owned().await;
        trace!(event_id = event_id, "Event lock acquired");

        EventLockGuard {
            guard: Some(guard),
            mutex,
            locks: self.locks.clone(),
            event_id,
        }
    }

    /// Number of events currently locked or waited on
    pub fn tracked_events(&self) -> usize {
        self.locks.len()
    }
}

/// Held lock on one event. Dropping it releases the lock and forgets the
/// event's mutex once nobody else holds or awaits it.
pub struct EventLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    mutex: Arc<Mutex<()>>,
    locks: Arc<LockMap>,
    event_id: i64,
}

impl Drop for EventLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Map entry plus our own handle; any waiter holds a third
        self.locks.remove_if(&self.event_id, |_, mutex| {
            Arc::ptr_eq(mutex, &self.mutex) && Arc::strong_count(mutex) == 2
        });
    }
}
