//! The matching engine: selects and reserves one volunteer per task.

use dispatch_core::scoring::{score_candidate, skill_bonus_radius_km};
use dispatch_core::task::Task;
use dispatch_core::volunteer::Volunteer;
use dispatch_store::{AssignmentStore, StoreError, TaskAssignment};
use std::sync::Arc;

/// Error type for assignment operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one assignment attempt.
#[derive(Debug, Clone)]
pub enum AssignmentOutcome {
    /// A volunteer was reserved and the task marked assigned.
    Assigned {
        volunteer: Volunteer,
        distance_km: f64,
    },
    /// No available volunteer existed; the task is waiting.
    NoCandidate,
}

/// Deterministic volunteer selection and reservation for one task at a time.
///
/// The engine holds no persistent state; everything it reads and writes
/// lives in the [`AssignmentStore`]. One engine instance serves both SOS
/// alerts and generic requests; the origin only changes the required
/// skill set and the skill-bonus radius, both supplied by the scoring
/// policy.
pub struct MatchingEngine<S> {
    store: Arc<S>,
}

impl<S> MatchingEngine<S>
where
    S: AssignmentStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Select and reserve the best volunteer for a task.
    ///
    /// Walks the available pool in listing order keeping a running best:
    /// a skill-matching candidate replaces the best when within the
    /// task's skill-bonus radius beyond it, and any candidate replaces it
    /// when strictly closer. The winner is reserved through the store's
    /// conditional update **before** the task's assignment fields are
    /// written, so no reader ever observes an assigned task pointing at a
    /// still-available volunteer.
    ///
    /// If the reservation is contested (another flow took the volunteer
    /// between read and write), selection re-runs against the refreshed
    /// pool; every contested round removes at least one candidate, so the
    /// loop terminates.
    ///
    /// # Errors
    ///
    /// Store failures propagate without retry. A failure after the
    /// reservation but before the task write leaves the volunteer busy
    /// with no task referencing it; `reset_all` on the lifecycle
    /// controller recovers from that window.
    pub async fn assign(&self, task: &Task) -> Result<AssignmentOutcome, EngineError> {
        loop {
            let candidates = self.store.available_volunteers().await?;
            if candidates.is_empty() {
                tracing::info!(task_id = %task.id, "no available volunteers, task waiting");
                self.store.mark_waiting(&task.id).await?;
                return Ok(AssignmentOutcome::NoCandidate);
            }

            let (best, distance_km) = Self::select_candidate(task, &candidates);

            if !self.store.reserve_volunteer(&best.id, &task.id).await? {
                tracing::debug!(
                    task_id = %task.id,
                    volunteer_id = %best.id,
                    "reservation contested, re-selecting"
                );
                continue;
            }

            let assignment = TaskAssignment::for_volunteer(best, distance_km);
            self.store.write_assignment(&task.id, assignment).await?;

            tracing::info!(
                task_id = %task.id,
                volunteer_id = %best.id,
                volunteer_name = %best.name,
                distance_km,
                "volunteer assigned"
            );
            return Ok(AssignmentOutcome::Assigned {
                volunteer: best.clone(),
                distance_km,
            });
        }
    }

    /// Tie-break walk over the candidate pool.
    ///
    /// Skill match grants a handicap of the task's bonus radius over pure
    /// distance ranking; it does not guarantee a skilled volunteer beats a
    /// much closer unskilled one.
    fn select_candidate<'a>(task: &Task, candidates: &'a [Volunteer]) -> (&'a Volunteer, f64) {
        let bonus = skill_bonus_radius_km(task);
        let mut best = &candidates[0];
        let mut best_distance = score_candidate(best, task).distance_km;

        for candidate in &candidates[1..] {
            let score = score_candidate(candidate, task);
            if score.skill_match && score.distance_km < best_distance + bonus {
                best = candidate;
                best_distance = score.distance_km;
            } else if score.distance_km < best_distance {
                best = candidate;
                best_distance = score.distance_km;
            }
        }
        (best, best_distance)
    }
}
