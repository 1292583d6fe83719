//! Deployment constants for one household.
//!
//! # Invariants
//! - A run aborts unless the catalog matches these counts exactly.

use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_EXPECTED_CHORES: usize = 12;
const DEFAULT_EXPECTED_ROOMS: usize = 18;

/// Fixed catalog sizes a run validates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Chores handed out per cycle.
    pub expected_chores: usize,
    /// Rooms in the household.
    pub expected_rooms: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            expected_chores: DEFAULT_EXPECTED_CHORES,
            expected_rooms: DEFAULT_EXPECTED_ROOMS,
        }
    }
}

impl SchedulerConfig {
    pub fn new(expected_chores: usize, expected_rooms: usize) -> Self {
        Self {
            expected_chores,
            expected_rooms,
        }
    }

    /// Rejects configurations no household could satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expected_chores == 0 {
            return Err(ConfigError::ZeroChores);
        }
        if self.expected_rooms == 0 {
            return Err(ConfigError::ZeroRooms);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ZeroChores,
    ZeroRooms,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroChores => write!(f, "expected chore count must be at least 1"),
            Self::ZeroRooms => write!(f, "expected room count must be at least 1"),
        }
    }
}

impl Error for ConfigError {}
