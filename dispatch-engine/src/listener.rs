//! Adapter from the store's change feed to the matching engine.

use crate::engine::{AssignmentOutcome, MatchingEngine};
use crate::guard::DeduplicationGuard;
use dispatch_core::task::{Task, TaskStatus};
use dispatch_core::volunteer::Volunteer;
use dispatch_store::{AssignmentStore, ChangeEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Consumes collection snapshots and feeds eligible tasks to the engine.
///
/// The listener is deliberately thin: eligibility filtering, cold-start
/// gating, and dedup live here; selection and reservation live in the
/// engine. Assignment attempts run on spawned tasks so a slow store write
/// never blocks the feed.
///
/// # Example
///
/// ```rust,ignore
/// let store = Arc::new(InMemoryStore::new());
/// let guard = Arc::new(DeduplicationGuard::new());
/// let engine = Arc::new(MatchingEngine::new(Arc::clone(&store)));
/// let listener = TaskFeedListener::new(store, engine, guard);
/// tokio::spawn(listener.run());
/// ```
pub struct TaskFeedListener<S> {
    store: Arc<S>,
    engine: Arc<MatchingEngine<S>>,
    guard: Arc<DeduplicationGuard>,
    jitter: Option<Duration>,
    ready: Arc<AtomicBool>,
}

impl<S> TaskFeedListener<S>
where
    S: AssignmentStore + 'static,
{
    pub fn new(
        store: Arc<S>,
        engine: Arc<MatchingEngine<S>>,
        guard: Arc<DeduplicationGuard>,
    ) -> Self {
        Self {
            store,
            engine,
            guard,
            jitter: None,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Delay each assignment attempt by a random duration up to `max`.
    ///
    /// De-synchronizes near-simultaneous triggers. Purely an optimization;
    /// correctness never depends on it.
    #[must_use]
    pub fn with_trigger_jitter(mut self, max: Option<Duration>) -> Self {
        self.jitter = max;
        self
    }

    /// Whether the initial volunteer pool has loaded.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Lift the cold-start gate without waiting for a volunteer snapshot.
    ///
    /// Normally the first non-empty volunteer snapshot does this; tests
    /// and deployments that seed the pool out of band call it directly.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Consume the change feed until the store closes it.
    ///
    /// Feed-level failures (a lagged receiver, a failed task listing) are
    /// logged and skipped; the next snapshot re-synchronizes. Nothing here
    /// is fatal to the process.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut events = self.store.subscribe();
        loop {
            match events.recv().await {
                Ok(ChangeEvent::Volunteers(volunteers)) => self.on_volunteers(volunteers).await,
                Ok(ChangeEvent::Tasks(tasks)) => self.on_tasks(tasks),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "change feed lagged, waiting for next snapshot");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("change feed closed, listener stopping");
        Ok(())
    }

    /// Volunteer snapshots lift the cold-start gate and re-evaluate
    /// waiting tasks: a volunteer becoming available is the event that
    /// un-sticks a `waiting_volunteers` task.
    async fn on_volunteers(&self, volunteers: Vec<Volunteer>) {
        if !volunteers.is_empty() && !self.ready.swap(true, Ordering::SeqCst) {
            tracing::info!(pool_size = volunteers.len(), "initial volunteer pool loaded");
        }
        if !self.is_ready() {
            return;
        }

        match self.store.list_tasks().await {
            Ok(tasks) => {
                for task in tasks {
                    // A waiting task's id stays held after its failed
                    // attempt; a volunteer change is the event that can
                    // un-stick it, so reopen the id here.
                    if task.status == TaskStatus::WaitingVolunteers {
                        self.guard.release(&task.id);
                    }
                    self.trigger(task);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to list tasks after volunteer change");
            }
        }
    }

    fn on_tasks(&self, tasks: Vec<Task>) {
        for task in tasks {
            self.trigger(task);
        }
    }

    /// Run one task through the eligibility gates and, if it passes,
    /// spawn an assignment attempt.
    fn trigger(&self, task: Task) {
        if !self.is_ready() {
            tracing::trace!(task_id = %task.id, "pool not loaded yet, skipping");
            return;
        }
        if !task.needs_assignment() {
            return;
        }
        if !self.guard.should_trigger(&task.id) {
            tracing::debug!(task_id = %task.id, "assignment already in flight");
            return;
        }

        let engine = Arc::clone(&self.engine);
        let guard = Arc::clone(&self.guard);
        let jitter = self.jitter;
        tokio::spawn(async move {
            if let Some(max) = jitter {
                tokio::time::sleep(max.mul_f64(rand::random::<f64>())).await;
            }

            match engine.assign(&task).await {
                Ok(AssignmentOutcome::Assigned { .. }) => {}
                Ok(AssignmentOutcome::NoCandidate) => {
                    // Keep the id held. The task snapshots this attempt
                    // produced are still in the feed; releasing now would
                    // re-admit the task from its own echo. The next
                    // volunteer snapshot reopens it.
                }
                Err(e) => {
                    tracing::error!(task_id = %task.id, error = %e, "assignment attempt failed");
                    guard.release(&task.id);
                }
            }
        });
    }
}
