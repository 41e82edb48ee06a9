//! Automatic volunteer assignment for disaster-relief tasks.
//!
//! The engine observes incoming SOS alerts and emergency requests through
//! a store change feed, selects a volunteer by distance and skill match,
//! atomically reserves that volunteer, and writes the assignment back.
//!
//! # Architecture
//!
//! - **MatchingEngine**: selection (tie-break walk) plus conditional
//!   reservation for one task at a time.
//! - **DeduplicationGuard**: process-local in-flight tracking so the
//!   re-entrant change feed cannot trigger the same task twice.
//! - **TaskFeedListener**: thin adapter from change-feed snapshots to the
//!   engine, with a cold-start gate over the initial volunteer pool load.
//! - **LifecycleController**: completion and bulk-reset operations.

mod engine;
mod guard;
mod lifecycle;
mod listener;

// Re-exports
pub use engine::{AssignmentOutcome, EngineError, MatchingEngine};
pub use guard::DeduplicationGuard;
pub use lifecycle::{LifecycleController, LifecycleError};
pub use listener::TaskFeedListener;

pub use dispatch_store as store;
