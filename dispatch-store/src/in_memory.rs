//! In-memory implementation of AssignmentStore.
//!
//! Thread-safe reference implementation backed by HashMaps. Suitable for
//! tests and single-process deployments; for durable storage, implement
//! AssignmentStore over a real document or relational backend.

use crate::store::{AssignmentStore, ChangeEvent, StoreError, TaskAssignment};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispatch_core::task::{Task, TaskStatus};
use dispatch_core::volunteer::{Volunteer, VolunteerStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

const FEED_CAPACITY: usize = 256;

/// In-memory store over two HashMaps plus a broadcast change feed.
///
/// Cloning is cheap and all clones share the same underlying collections,
/// so a clone can stand in for a second process in tests.
#[derive(Clone)]
pub struct InMemoryStore {
    volunteers: Arc<RwLock<HashMap<String, Volunteer>>>,
    tasks: Arc<RwLock<HashMap<String, Task>>>,
    events: broadcast::Sender<ChangeEvent>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            volunteers: Arc::new(RwLock::new(HashMap::new())),
            tasks: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    fn sorted_volunteers(volunteers: &HashMap<String, Volunteer>) -> Vec<Volunteer> {
        let mut all: Vec<Volunteer> = volunteers.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        all
    }

    fn sorted_tasks(tasks: &HashMap<String, Task>) -> Vec<Task> {
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    fn publish(&self, event: ChangeEvent) {
        // No subscribers is fine; the store works standalone.
        let _ = self.events.send(event);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssignmentStore for InMemoryStore {
    async fn create_volunteer(&self, volunteer: Volunteer) -> Result<(), StoreError> {
        let snapshot = {
            let mut volunteers = self
                .volunteers
                .write()
                .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
            volunteers.insert(volunteer.id.clone(), volunteer);
            Self::sorted_volunteers(&volunteers)
        };
        self.publish(ChangeEvent::Volunteers(snapshot));
        Ok(())
    }

    async fn create_task(&self, task: Task) -> Result<(), StoreError> {
        let snapshot = {
            let mut tasks = self
                .tasks
                .write()
                .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
            tasks.insert(task.id.clone(), task);
            Self::sorted_tasks(&tasks)
        };
        self.publish(ChangeEvent::Tasks(snapshot));
        Ok(())
    }

    async fn volunteer(&self, id: &str) -> Result<Volunteer, StoreError> {
        let volunteers = self
            .volunteers
            .read()
            .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
        volunteers
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn task(&self, id: &str) -> Result<Task, StoreError> {
        let tasks = self
            .tasks
            .read()
            .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
        tasks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, StoreError> {
        let volunteers = self
            .volunteers
            .read()
            .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
        Ok(Self::sorted_volunteers(&volunteers))
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = self
            .tasks
            .read()
            .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
        Ok(Self::sorted_tasks(&tasks))
    }

    async fn available_volunteers(&self) -> Result<Vec<Volunteer>, StoreError> {
        let volunteers = self
            .volunteers
            .read()
            .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
        let mut available: Vec<Volunteer> = volunteers
            .values()
            .filter(|v| v.is_available())
            .cloned()
            .collect();
        available.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(available)
    }

    async fn reserve_volunteer(
        &self,
        volunteer_id: &str,
        task_id: &str,
    ) -> Result<bool, StoreError> {
        let snapshot = {
            let mut volunteers = self
                .volunteers
                .write()
                .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
            let volunteer = volunteers
                .get_mut(volunteer_id)
                .ok_or_else(|| StoreError::NotFound(volunteer_id.to_string()))?;

            // Conditional update: the write happens only while the lock is
            // held and only from the available state, so two racing
            // reservations cannot both succeed.
            if volunteer.status != VolunteerStatus::Available {
                return Ok(false);
            }
            volunteer.status = VolunteerStatus::Busy;
            volunteer.current_assignment = Some(task_id.to_string());
            Self::sorted_volunteers(&volunteers)
        };
        self.publish(ChangeEvent::Volunteers(snapshot));
        Ok(true)
    }

    async fn release_volunteer(
        &self,
        volunteer_id: &str,
        completed: bool,
    ) -> Result<(), StoreError> {
        let snapshot = {
            let mut volunteers = self
                .volunteers
                .write()
                .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
            let volunteer = volunteers
                .get_mut(volunteer_id)
                .ok_or_else(|| StoreError::NotFound(volunteer_id.to_string()))?;
            volunteer.status = VolunteerStatus::Available;
            volunteer.current_assignment = None;
            if completed {
                volunteer.completed_tasks += 1;
            }
            Self::sorted_volunteers(&volunteers)
        };
        self.publish(ChangeEvent::Volunteers(snapshot));
        Ok(())
    }

    async fn write_assignment(
        &self,
        task_id: &str,
        assignment: TaskAssignment,
    ) -> Result<(), StoreError> {
        let snapshot = {
            let mut tasks = self
                .tasks
                .write()
                .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
            task.status = TaskStatus::Assigned;
            task.assigned_volunteer_id = Some(assignment.volunteer_id);
            task.assigned_volunteer_name = Some(assignment.volunteer_name);
            task.volunteer_phone = Some(assignment.volunteer_phone);
            task.volunteer_skills = assignment.volunteer_skills;
            task.assigned_at = Some(assignment.assigned_at);
            task.estimated_distance_km = Some(assignment.distance_km);
            task.estimated_arrival_min = Some(assignment.arrival_min);
            Self::sorted_tasks(&tasks)
        };
        self.publish(ChangeEvent::Tasks(snapshot));
        Ok(())
    }

    async fn mark_waiting(&self, task_id: &str) -> Result<(), StoreError> {
        let snapshot = {
            let mut tasks = self
                .tasks
                .write()
                .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
            // Already waiting: publishing the unchanged record would feed
            // the attempt that just observed the empty pool back to itself.
            if task.status == TaskStatus::WaitingVolunteers {
                return Ok(());
            }
            task.status = TaskStatus::WaitingVolunteers;
            Self::sorted_tasks(&tasks)
        };
        self.publish(ChangeEvent::Tasks(snapshot));
        Ok(())
    }

    async fn complete_task(
        &self,
        task_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let snapshot = {
            let mut tasks = self
                .tasks
                .write()
                .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))?;
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
            if task.status == TaskStatus::Completed {
                return Ok(false);
            }
            task.status = TaskStatus::Completed;
            task.completed_at = Some(completed_at);
            task.resolved = true;
            Self::sorted_tasks(&tasks)
        };
        self.publish(ChangeEvent::Tasks(snapshot));
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}
