//! Cycle headers and assignment history.
//!
//! # Responsibility
//! - Describe one scheduling run (`Cycle`) and the facts it produced
//!   (`Assignment`).
//!
//! # Invariants
//! - `Cycle::sequence` is strictly increasing across the ledger and is the
//!   only ordering primitive. Cycle ids are opaque labels.
//! - Assignment ids are `{cycle_id}_a{NN}` with a 1-based two-digit index.

use crate::model::household::{ChoreId, MemberId, RoomId};
use serde::{Deserialize, Serialize};

/// Opaque, human-readable cycle label (for example `2026-10-17_093015`).
pub type CycleId = String;

/// Header record of one completed scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: CycleId,
    /// Monotonic position of this cycle in the ledger, starting at 1.
    pub sequence: u64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub total_chores: u32,
}

/// Lifecycle state of one assignment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Produced by the scheduler.
    Assigned,
    /// Marked done after the fact.
    Completed,
    /// Marked as not done after the fact.
    Skipped,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "assigned" => Some(Self::Assigned),
            "completed" => Some(Self::Completed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// Immutable historical fact: one chore given to one member of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub cycle_id: CycleId,
    pub chore_id: ChoreId,
    pub room_id: RoomId,
    pub member_id: MemberId,
    pub status: AssignmentStatus,
    /// Whether the no-consecutive rule was waived to fill this slot.
    #[serde(default)]
    pub relaxed: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Builds the assignment id for the `index`-th (0-based) pick of a cycle.
pub fn assignment_id(cycle_id: &str, index: usize) -> String {
    format!("{cycle_id}_a{:02}", index + 1)
}
