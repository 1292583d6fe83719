//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository reads, the pure scheduler, and the atomic commit
//!   into use-case level APIs.
//! - Keep CLI callers decoupled from storage details.

pub mod cycle_service;
