//! Persisted, subscribable storage for volunteers and tasks.
//!
//! This crate abstracts the document store behind the assignment core,
//! enabling implementations over any backend that can express one atomic
//! conditional update (document database, relational table, in-memory
//! test double).
//!
//! # Architecture
//!
//! - **AssignmentStore**: a trait over the Volunteer and Task collections.
//!   Its one non-negotiable capability is `reserve_volunteer`, a
//!   compare-and-swap on the volunteer's status; everything else is plain
//!   reads and writes plus a change feed.
//! - **ChangeEvent**: every mutation publishes the affected collection's
//!   full current record set to all subscribers, mirroring snapshot-style
//!   document listeners.
//! - **InMemoryStore**: the reference implementation, also used as the
//!   test double.
//!
//! # Implementing Custom Stores
//!
//! 1. Add `dispatch-store` as a dependency
//! 2. Implement the `AssignmentStore` trait
//! 3. Back `reserve_volunteer` with a genuinely atomic conditional update
//!    (transaction, `UPDATE ... WHERE status = 'available'`, or similar).
//!    An unconditional write reintroduces the double-assignment race the
//!    trait exists to close

mod in_memory;
mod store;

pub use in_memory::InMemoryStore;
pub use store::{AssignmentStore, ChangeEvent, StoreError, TaskAssignment};
