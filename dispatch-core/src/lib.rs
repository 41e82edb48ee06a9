pub mod geo;
pub mod scoring;
pub mod task;
pub mod volunteer;

// Re-exports
pub use geo::{Coord, distance_km};
pub use scoring::{CandidateScore, ResponseBand, response_band, score_candidate};
pub use task::{Task, TaskLocation, TaskOrigin, TaskPriority, TaskStatus};
pub use volunteer::{Volunteer, VolunteerStatus};
