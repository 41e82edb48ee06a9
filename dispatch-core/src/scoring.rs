//! Candidate scoring policy.
//!
//! Scoring does not collapse to a single scalar: selection is a tie-break
//! walk over candidates (see the matching engine), driven by the distance
//! and skill-match facts computed here.

use crate::geo::distance_km;
use crate::task::{Task, TaskOrigin, TaskPriority};
use crate::volunteer::Volunteer;
use std::fmt;

/// Skills that qualify a volunteer for any SOS alert.
pub const EMERGENCY_SKILLS: [&str; 4] = ["sos", "emergency", "medical", "police"];

/// Skill handicap for SOS alerts: a skilled candidate beats the current
/// best if within this many kilometres beyond it.
pub const SOS_SKILL_BONUS_KM: f64 = 1.0;

/// Skill handicap for generic requests.
pub const REQUEST_SKILL_BONUS_KM: f64 = 2.0;

/// Fixed travel-speed constant: 20 km/h, i.e. 3 minutes per kilometre.
/// Shared by both task origins on purpose; tune in one place.
pub const MINUTES_PER_KM: f64 = 3.0;

/// The two facts the engine's tie-break walk consumes per candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub distance_km: f64,
    pub skill_match: bool,
}

/// Whether a volunteer's skills qualify them for a task.
///
/// SOS alerts accept any emergency-relevant skill ([`EMERGENCY_SKILLS`],
/// case-insensitive). Generic requests use case-insensitive substring
/// overlap in either direction between each skill and the task kind, so
/// skill "medical" matches kind "medical emergency" and vice versa.
pub fn skill_match(volunteer: &Volunteer, task: &Task) -> bool {
    match task.origin {
        TaskOrigin::Sos => volunteer
            .skills
            .iter()
            .any(|skill| EMERGENCY_SKILLS.contains(&skill.to_lowercase().as_str())),
        TaskOrigin::Request => {
            let kind = task.kind.to_lowercase();
            volunteer.skills.iter().any(|skill| {
                let skill = skill.to_lowercase();
                skill.contains(&kind) || kind.contains(&skill)
            })
        }
    }
}

/// Score one candidate against one task.
pub fn score_candidate(volunteer: &Volunteer, task: &Task) -> CandidateScore {
    CandidateScore {
        distance_km: distance_km(task.location.coord(), volunteer.location),
        skill_match: skill_match(volunteer, task),
    }
}

/// Skill handicap radius for a task, by origin.
pub fn skill_bonus_radius_km(task: &Task) -> f64 {
    match task.origin {
        TaskOrigin::Sos => SOS_SKILL_BONUS_KM,
        TaskOrigin::Request => REQUEST_SKILL_BONUS_KM,
    }
}

/// Expected response window for a priority, in minutes.
///
/// Owned by request intake; the engine's per-assignment ETA
/// ([`estimated_arrival_min`]) is distance-based and independent of this
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseBand {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl fmt::Display for ResponseBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} mins", self.min_minutes, self.max_minutes)
    }
}

/// Priority to response-time band lookup.
pub fn response_band(priority: TaskPriority) -> ResponseBand {
    let (min_minutes, max_minutes) = match priority {
        TaskPriority::Critical => (5, 10),
        TaskPriority::High => (10, 20),
        TaskPriority::Medium => (20, 45),
        TaskPriority::Low => (45, 90),
    };
    ResponseBand {
        min_minutes,
        max_minutes,
    }
}

/// Estimated arrival time in minutes for a travel distance.
pub fn estimated_arrival_min(distance_km: f64) -> u32 {
    (distance_km * MINUTES_PER_KM).round() as u32
}

/// Round a distance to two decimal places for display fields.
pub fn round_km(distance_km: f64) -> f64 {
    (distance_km * 100.0).round() / 100.0
}
