//! Completion and operational-reset operations.

use crate::guard::DeduplicationGuard;
use chrono::Utc;
use dispatch_store::{AssignmentStore, StoreError};
use std::sync::Arc;

/// Error type for lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The task was already completed; nothing was mutated.
    #[error("Task already completed: {0}")]
    AlreadyCompleted(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// User-triggered completion and recovery operations.
///
/// Shares the engine's guard so a bulk reset also clears in-flight
/// dedup state.
pub struct LifecycleController<S> {
    store: Arc<S>,
    guard: Arc<DeduplicationGuard>,
}

impl<S> LifecycleController<S>
where
    S: AssignmentStore,
{
    pub fn new(store: Arc<S>, guard: Arc<DeduplicationGuard>) -> Self {
        Self { store, guard }
    }

    /// Mark a task completed and release its volunteer.
    ///
    /// The task is written first, then the volunteer (the reverse of the
    /// assignment ordering), so a reader never observes an available
    /// volunteer still bound to an open task.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyCompleted`] on a duplicate call.
    /// The store's conditional transition decides the winner, so two
    /// racing completions release the volunteer and bump the
    /// completed-task counter exactly once.
    pub async fn complete(&self, task_id: &str, volunteer_id: &str) -> Result<(), LifecycleError> {
        if !self.store.complete_task(task_id, Utc::now()).await? {
            return Err(LifecycleError::AlreadyCompleted(task_id.to_string()));
        }
        self.store.release_volunteer(volunteer_id, true).await?;

        tracing::info!(task_id, volunteer_id, "task completed, volunteer released");
        Ok(())
    }

    /// Return every volunteer to the available pool and clear the guard.
    ///
    /// Operational recovery after a stuck state (e.g. a volunteer left
    /// busy by a partial assignment failure), not a substitute for
    /// [`complete`](Self::complete): counters are left untouched.
    pub async fn reset_all(&self) -> Result<(), LifecycleError> {
        let volunteers = self.store.list_volunteers().await?;
        let count = volunteers.len();
        for volunteer in volunteers {
            self.store.release_volunteer(&volunteer.id, false).await?;
        }
        self.guard.clear();

        tracing::info!(count, "all volunteers reset to available");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::geo::Coord;
    use dispatch_core::task::{Task, TaskLocation, TaskPriority, TaskStatus};
    use dispatch_core::volunteer::Volunteer;
    use dispatch_store::{InMemoryStore, TaskAssignment};

    async fn seeded() -> (Arc<InMemoryStore>, Arc<DeduplicationGuard>) {
        let store = Arc::new(InMemoryStore::new());
        let guard = Arc::new(DeduplicationGuard::new());

        let volunteer = Volunteer::new(
            "v1",
            "Lisa",
            vec!["medical".into()],
            Coord::new(12.818, 80.038),
        );
        store.create_volunteer(volunteer.clone()).await.unwrap();
        store
            .create_task(Task::request(
                "t1",
                "medical",
                TaskPriority::High,
                TaskLocation::new(12.821, 80.041, ""),
            ))
            .await
            .unwrap();

        store.reserve_volunteer("v1", "t1").await.unwrap();
        store
            .write_assignment("t1", TaskAssignment::for_volunteer(&volunteer, 0.5))
            .await
            .unwrap();
        (store, guard)
    }

    #[tokio::test]
    async fn completion_releases_the_volunteer() {
        let (store, guard) = seeded().await;
        let lifecycle = LifecycleController::new(Arc::clone(&store), guard);

        lifecycle.complete("t1", "v1").await.unwrap();

        let t = store.task("t1").await.unwrap();
        assert_eq!(t.status, TaskStatus::Completed);
        assert!(t.resolved);
        assert!(t.completed_at.is_some());

        let v = store.volunteer("v1").await.unwrap();
        assert!(v.is_available());
        assert!(v.current_assignment.is_none());
        assert_eq!(v.completed_tasks, 1);
    }

    #[tokio::test]
    async fn duplicate_completion_reports_without_mutating() {
        let (store, guard) = seeded().await;
        let lifecycle = LifecycleController::new(Arc::clone(&store), guard);

        lifecycle.complete("t1", "v1").await.unwrap();
        let result = lifecycle.complete("t1", "v1").await;
        assert!(matches!(result, Err(LifecycleError::AlreadyCompleted(_))));

        // Counter must not double-increment.
        assert_eq!(store.volunteer("v1").await.unwrap().completed_tasks, 1);
    }

    #[tokio::test]
    async fn completing_a_missing_task_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let lifecycle =
            LifecycleController::new(Arc::clone(&store), Arc::new(DeduplicationGuard::new()));
        assert!(matches!(
            lifecycle.complete("nope", "v1").await,
            Err(LifecycleError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn reset_frees_volunteers_and_clears_the_guard() {
        let (store, guard) = seeded().await;
        guard.should_trigger("t1");
        let lifecycle = LifecycleController::new(Arc::clone(&store), Arc::clone(&guard));

        lifecycle.reset_all().await.unwrap();

        let v = store.volunteer("v1").await.unwrap();
        assert!(v.is_available());
        assert!(v.current_assignment.is_none());
        assert_eq!(v.completed_tasks, 0);
        assert_eq!(guard.in_flight(), 0);
    }
}
