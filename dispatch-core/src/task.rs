//! Task records: SOS alerts and emergency requests share one lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a task entered the system.
///
/// SOS alerts and emergency requests differ only in origin and in the
/// matching parameters derived from it (required skills, skill-bonus
/// radius); the lifecycle is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOrigin {
    Sos,
    Request,
}

/// Intake priority. SOS tasks are always `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Critical,
    High,
    Medium,
    Low,
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    WaitingVolunteers,
    Assigned,
    #[serde(rename = "in-progress")]
    InProgress,
    Completed,
}

/// Task position plus the human-readable address intake captured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskLocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: String,
}

impl TaskLocation {
    pub fn new(lat: f64, lng: f64, address: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            address: address.into(),
        }
    }

    pub fn coord(&self) -> crate::geo::Coord {
        crate::geo::Coord::new(self.lat, self.lng)
    }
}

/// A unit of work requiring a volunteer response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub origin: TaskOrigin,
    /// Free-text category, e.g. "medical", "fire", "food". SOS tasks carry
    /// "sos".
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: TaskPriority,
    pub location: TaskLocation,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Set iff status is `Assigned`, `InProgress`, or `Completed`.
    #[serde(default)]
    pub assigned_volunteer_id: Option<String>,
    #[serde(default)]
    pub assigned_volunteer_name: Option<String>,
    /// Denormalized for display alongside the assignment.
    #[serde(default)]
    pub volunteer_phone: Option<String>,
    #[serde(default)]
    pub volunteer_skills: Vec<String>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_distance_km: Option<f64>,
    #[serde(default)]
    pub estimated_arrival_min: Option<u32>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a pending emergency request.
    pub fn request(
        id: impl Into<String>,
        kind: impl Into<String>,
        priority: TaskPriority,
        location: TaskLocation,
    ) -> Self {
        Self {
            id: id.into(),
            origin: TaskOrigin::Request,
            kind: kind.into(),
            priority,
            location,
            description: None,
            status: TaskStatus::Pending,
            assigned_volunteer_id: None,
            assigned_volunteer_name: None,
            volunteer_phone: None,
            volunteer_skills: Vec::new(),
            assigned_at: None,
            estimated_distance_km: None,
            estimated_arrival_min: None,
            completed_at: None,
            resolved: false,
            created_at: Utc::now(),
        }
    }

    /// Create a pending SOS alert. Always critical, kind "sos".
    pub fn sos(id: impl Into<String>, location: TaskLocation) -> Self {
        let mut task = Self::request(id, "sos", TaskPriority::Critical, location);
        task.origin = TaskOrigin::Sos;
        task
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the matching engine should consider this task.
    ///
    /// Pending or waiting, nothing bound yet, not resolved out of band.
    pub fn needs_assignment(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Pending | TaskStatus::WaitingVolunteers
        ) && self.assigned_volunteer_id.is_none()
            && !self.resolved
    }

    /// Older than 24 hours. Display layers drop stale completed tasks;
    /// the core itself never deletes anything.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) > chrono::Duration::hours(24)
    }
}
