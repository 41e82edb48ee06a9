//! The store trait, its error type, and the change-feed event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispatch_core::scoring::{estimated_arrival_min, round_km};
use dispatch_core::task::Task;
use dispatch_core::volunteer::Volunteer;
use tokio::sync::broadcast;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record with the given id.
    #[error("Record not found: {0}")]
    NotFound(String),
    /// Store-specific failure (lost connection, poisoned lock, ...).
    #[error("Store error: {0}")]
    Backend(String),
}

/// A change notification carrying the full current record set of the
/// collection that changed.
///
/// Snapshot semantics, not deltas: listeners always see complete state and
/// must tolerate observing the same record several times.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    Volunteers(Vec<Volunteer>),
    Tasks(Vec<Task>),
}

/// The fields written onto a task when a volunteer is bound to it.
///
/// Phone and skills are denormalized onto the task record so display
/// layers never need a second lookup.
#[derive(Debug, Clone)]
pub struct TaskAssignment {
    pub volunteer_id: String,
    pub volunteer_name: String,
    pub volunteer_phone: String,
    pub volunteer_skills: Vec<String>,
    pub assigned_at: DateTime<Utc>,
    /// Rounded to two decimal places.
    pub distance_km: f64,
    pub arrival_min: u32,
}

impl TaskAssignment {
    /// Build the assignment payload for a volunteer at the given distance.
    pub fn for_volunteer(volunteer: &Volunteer, distance_km: f64) -> Self {
        Self {
            volunteer_id: volunteer.id.clone(),
            volunteer_name: volunteer.name.clone(),
            volunteer_phone: volunteer.phone.clone(),
            volunteer_skills: volunteer.skills.clone(),
            assigned_at: Utc::now(),
            distance_km: round_km(distance_km),
            arrival_min: estimated_arrival_min(distance_km),
        }
    }
}

/// Trait for the persisted Volunteer and Task collections.
///
/// The matching engine owns no state of its own; every record it reads or
/// writes goes through this trait. Listing order is part of the contract
/// because the engine's tie-break walk is order-sensitive: volunteers are
/// returned sorted by name ascending, tasks by creation time.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Insert or replace a volunteer record.
    async fn create_volunteer(&self, volunteer: Volunteer) -> Result<(), StoreError>;

    /// Insert or replace a task record.
    async fn create_task(&self, task: Task) -> Result<(), StoreError>;

    /// Fetch one volunteer.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no such volunteer exists.
    async fn volunteer(&self, id: &str) -> Result<Volunteer, StoreError>;

    /// Fetch one task.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no such task exists.
    async fn task(&self, id: &str) -> Result<Task, StoreError>;

    /// All volunteers, sorted by name ascending.
    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, StoreError>;

    /// All tasks, sorted by creation time.
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// All currently available volunteers, sorted by name ascending.
    async fn available_volunteers(&self) -> Result<Vec<Volunteer>, StoreError>;

    /// Atomically reserve a volunteer for a task.
    ///
    /// Sets status to busy and binds `current_assignment` **only if** the
    /// volunteer is currently available. Returns `Ok(false)` when another
    /// flow reserved the volunteer first; the caller must re-select.
    ///
    /// This conditional update is the correctness boundary for concurrent
    /// assignment: two racing flows cannot both observe `true` for the
    /// same volunteer.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no such volunteer exists.
    async fn reserve_volunteer(&self, volunteer_id: &str, task_id: &str)
    -> Result<bool, StoreError>;

    /// Release a volunteer back to the available pool.
    ///
    /// Clears `current_assignment`; when `completed` is set, also
    /// increments the volunteer's completed-task counter.
    async fn release_volunteer(&self, volunteer_id: &str, completed: bool)
    -> Result<(), StoreError>;

    /// Write the assignment fields onto a task and mark it assigned.
    async fn write_assignment(
        &self,
        task_id: &str,
        assignment: TaskAssignment,
    ) -> Result<(), StoreError>;

    /// Mark a task as waiting for volunteers (no candidate existed).
    ///
    /// Implementations must treat a task that is already waiting as a
    /// no-op and publish nothing: the write that marks a task waiting is
    /// observed by the same feed that triggered the attempt, and
    /// republishing an unchanged record would retrigger it endlessly.
    async fn mark_waiting(&self, task_id: &str) -> Result<(), StoreError>;

    /// Mark a task completed and resolved at the given time.
    ///
    /// Conditional transition: returns `Ok(true)` when this call moved
    /// the task to completed, `Ok(false)` when it was already completed
    /// (no mutation, nothing published). Callers racing on the same task
    /// therefore observe exactly one `true`.
    async fn complete_task(
        &self,
        task_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Subscribe to the change feed.
    ///
    /// Every successful mutation publishes a [`ChangeEvent`] with the
    /// affected collection's full record set. Slow subscribers may observe
    /// a lagged receiver and should resynchronize from the next event.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
