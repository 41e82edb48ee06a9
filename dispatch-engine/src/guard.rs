//! Process-local idempotency guard for assignment triggers.

use std::collections::HashSet;
use std::sync::Mutex;

/// Tracks which task ids currently have an assignment attempt in flight.
///
/// The change feed is re-entrant: reserving a volunteer and writing the
/// task's assignment fields each re-deliver snapshots containing the task
/// that triggered them. Without this guard every assignment would trigger
/// itself again before the first attempt finishes.
///
/// This is best-effort and process-local. The store's conditional
/// reservation remains the correctness boundary; the guard only cuts
/// redundant work and log noise. Each engine owns its own instance, so
/// tests and multi-tenant setups get clean isolation.
#[derive(Debug, Default)]
pub struct DeduplicationGuard {
    in_flight: Mutex<HashSet<String>>,
}

impl DeduplicationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a task as in flight.
    ///
    /// Returns `true` exactly once per task id; every later call returns
    /// `false` until the id is released or the guard is cleared.
    pub fn should_trigger(&self, task_id: &str) -> bool {
        self.lock().insert(task_id.to_string())
    }

    /// Drop one task id so the trigger path may re-admit it.
    ///
    /// Called when a volunteer change reopens a waiting task, and after
    /// an attempt fails with a store error. Never called from inside a
    /// no-candidate attempt: the snapshots that attempt published are
    /// still in the feed, and releasing against them would let the task
    /// retrigger itself.
    pub fn release(&self, task_id: &str) {
        self.lock().remove(task_id);
    }

    /// Reset all guard state. Used by bulk reset and test setup.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of task ids currently in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // A poisoned set of ids is still usable; recover it.
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn triggers_exactly_once_until_cleared() {
        let guard = DeduplicationGuard::new();
        assert!(guard.should_trigger("t1"));
        assert!(!guard.should_trigger("t1"));
        guard.clear();
        assert!(guard.should_trigger("t1"));
    }

    #[test]
    fn release_reopens_a_single_id() {
        let guard = DeduplicationGuard::new();
        assert!(guard.should_trigger("t1"));
        assert!(guard.should_trigger("t2"));
        guard.release("t1");
        assert!(guard.should_trigger("t1"));
        assert!(!guard.should_trigger("t2"));
    }

    #[test]
    fn in_flight_counts_members() {
        let guard = DeduplicationGuard::new();
        guard.should_trigger("t1");
        guard.should_trigger("t2");
        assert_eq!(guard.in_flight(), 2);
        guard.clear();
        assert_eq!(guard.in_flight(), 0);
    }

    #[test]
    fn concurrent_triggers_admit_one_winner() {
        let guard = Arc::new(DeduplicationGuard::new());
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    if guard.should_trigger("t1") {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
    }
}
