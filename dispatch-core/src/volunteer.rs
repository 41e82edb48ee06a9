//! Volunteer records and availability states.

use crate::geo::Coord;
use serde::{Deserialize, Serialize};

/// Availability of a volunteer for assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolunteerStatus {
    Available,
    Busy,
}

/// A registered relief volunteer.
///
/// Only `skills`, `location`, and `status` influence matching; the rest are
/// carried for display and for future scoring extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub specialty: String,
    /// Lowercase skill tags, e.g. "medical", "sos", "fire".
    #[serde(default)]
    pub skills: Vec<String>,
    /// Last known position; zero components mean unknown.
    #[serde(default)]
    pub location: Coord,
    pub status: VolunteerStatus,
    /// Task id this volunteer is reserved for; set iff status is `Busy`.
    #[serde(default)]
    pub current_assignment: Option<String>,
    /// Informational; not used by the current scoring policy.
    #[serde(default)]
    pub rating: u8,
    /// Informational; incremented on each completed task.
    #[serde(default)]
    pub completed_tasks: u32,
}

impl Volunteer {
    /// Create an available volunteer with the given skills and position.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        skills: Vec<String>,
        location: Coord,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: String::new(),
            specialty: String::new(),
            skills,
            location,
            status: VolunteerStatus::Available,
            current_assignment: None,
            rating: 0,
            completed_tasks: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == VolunteerStatus::Available
    }
}
