use std::{collections::HashMap, sync::Arc};

use parking_lot::{Mutex, MutexGuard};

/// One mutex per validator index. Attestations of the same validator run one at a time while
/// different validators proceed in parallel.
#[derive(Debug, Default)]
pub struct ValidatorLocks {
    locks: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl ValidatorLocks {
    /// Returns the lock for `validator_index`. The map lock is released before returning.
    pub fn lock_for(&self, validator_index: u64) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(validator_index)
            .or_default()
            .clone()
    }

    /// Runs `f` while holding the lock of `validator_index`.
    pub fn with_lock<T>(&self, validator_index: u64, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(validator_index);
        let _guard: MutexGuard<'_, ()> = lock.lock();
        f()
    }

    /// Forgets locks nobody else holds a handle to.
    pub fn prune_idle(&self) {
        self.locks
            .lock()
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    use super::*;

    #[test]
    fn test_same_validator_shares_lock() {
        let locks = ValidatorLocks::default();

        assert!(Arc::ptr_eq(&locks.lock_for(1), &locks.lock_for(1)));
        assert!(!Arc::ptr_eq(&locks.lock_for(1), &locks.lock_for(2)));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_with_lock_serializes_same_validator() {
        let locks = ValidatorLocks::default();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        locks.with_lock(5, || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_inside.fetch_max(now, Ordering::SeqCst);
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prune_idle() {
        let locks = ValidatorLocks::default();
        let held = locks.lock_for(1);
        locks.lock_for(2);

        locks.prune_idle();

        assert_eq!(locks.len(), 1);
        assert!(Arc::ptr_eq(&held, &locks.lock_for(1)));
    }
}
