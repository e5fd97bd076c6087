//! Per-rumor lock table
//!
//! One exclusive lock per root rumor covers the rumor, all its variants and
//! all beliefs in them. Writers to different rumors never contend.

use crate::RumorError;
use dashmap::DashMap;
use parking_lot::Mutex;
use rumor_domain::RumorId;
use std::sync::Arc;
use std::time::Duration;

/// Exclusive locks keyed by rumor id, created on first use
pub struct RumorLocks {
    locks: DashMap<RumorId, Arc<Mutex<()>>>,
    timeout: Duration,
    max_retries: u32,
}

impl RumorLocks {
    /// Create a lock table
    ///
    /// Each acquisition waits up to `timeout`, and is retried `max_retries`
    /// times before giving up with `ConcurrencyConflict`.
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
            max_retries,
        }
    }

    /// Run `f` while holding the lock for `id`
    pub fn with_lock<T>(
        &self,
        id: RumorId,
        f: impl FnOnce() -> Result<T, RumorError>,
    ) -> Result<T, RumorError> {
        // Clone the Arc so the map shard is released before blocking
        let lock = Arc::clone(
            self.locks
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );

        for attempt in 0..=self.max_retries {
            if let Some(_guard) = lock.try_lock_for(self.timeout) {
                return f();
            }
            tracing::warn!(
                rumor_id = %id,
                attempt = attempt + 1,
                max_attempts = self.max_retries + 1,
                "Timed out waiting for rumor lock"
            );
        }

        Err(RumorError::ConcurrencyConflict(id))
    }

    /// Drop the lock entry of a deleted rumor
    pub fn forget(&self, id: RumorId) {
        self.locks.remove(&id);
    }

    /// Number of rumors with a lock entry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no lock has been created yet
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn test_lock_runs_closure() {
        let locks = RumorLocks::new(Duration::from_millis(50), 0);
        let id = RumorId::new();
        assert_eq!(locks.with_lock(id, || Ok(7)).unwrap(), 7);
        assert_eq!(locks.len(), 1);

        locks.forget(id);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_contention_exhausts_retries() {
        let locks = Arc::new(RumorLocks::new(Duration::from_millis(10), 2));
        let id = RumorId::new();
        let barrier = Arc::new(Barrier::new(2));

        let holder = {
            let locks = Arc::clone(&locks);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                locks
                    .with_lock(id, || {
                        barrier.wait();
                        std::thread::sleep(Duration::from_millis(300));
                        Ok(())
                    })
                    .unwrap();
            })
        };

        barrier.wait();
        let result = locks.with_lock(id, || Ok(()));
        assert!(matches!(result, Err(RumorError::ConcurrencyConflict(conflict)) if conflict == id));
        holder.join().unwrap();
    }

    #[test]
    fn test_same_rumor_is_serialized() {
        let locks = Arc::new(RumorLocks::new(Duration::from_secs(5), 0));
        let id = RumorId::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let overlaps = Arc::clone(&overlaps);
                std::thread::spawn(move || {
                    locks
                        .with_lock(id, || {
                            if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                                overlaps.fetch_add(1, Ordering::SeqCst);
                            }
                            std::thread::sleep(Duration::from_millis(2));
                            inside.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
