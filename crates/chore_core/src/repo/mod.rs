//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the catalog reader, cycle existence check and batch writer the
//!   cycle service depends on.
//! - Isolate SQLite query details from scheduling and orchestration.
//!
//! # Invariants
//! - Batch writes are all-or-nothing.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod household_repo;
