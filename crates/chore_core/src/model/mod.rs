//! Household domain model for the chore rotation.
//!
//! # Responsibility
//! - Define the records the scheduler reasons over (chores, rooms, members).
//! - Define the append-only history records (cycles, assignments).
//!
//! # Invariants
//! - A member belongs to exactly one room for the lifetime of the data set.
//! - Cycle headers and assignments are never mutated once written.

pub mod cycle;
pub mod household;
pub mod snapshot;
