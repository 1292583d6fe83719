//! Reference data and fairness counters for a household.
//!
//! # Responsibility
//! - Describe chores, rooms and members as flat records.
//! - Carry the persisted fairness counters (`debt`, `assignment_count`).
//!
//! # Invariants
//! - `occupancy` (not `capacity`) is the basis for proportional allocation.
//! - `Room::member_ids` is ordered; the order is the tie-break order used by
//!   member selection.
//! - Missing numeric fields default to zero.

use serde::{Deserialize, Serialize};

/// Stable chore identifier (for example `chore_01`).
pub type ChoreId = String;
/// Stable room identifier (for example `room_01`).
pub type RoomId = String;
/// Stable member identifier (for example `member_sammy_s`).
pub type MemberId = String;

/// One recurring task. Chores are static reference data with no state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chore {
    pub id: ChoreId,
    pub name: String,
}

impl Chore {
    pub fn new(id: impl Into<ChoreId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Fixed-capacity unit that members live in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub capacity: u32,
    /// People currently living in the room. Unoccupied capacity has no
    /// fairness claim.
    #[serde(default)]
    pub occupancy: u32,
    /// Rotation roster in stable order.
    #[serde(default)]
    pub member_ids: Vec<MemberId>,
    /// Running fractional fair-share debt, persisted across cycles.
    #[serde(default)]
    pub debt: f64,
}

impl Room {
    /// Creates a room whose occupancy matches the given roster.
    pub fn with_roster(
        id: impl Into<RoomId>,
        name: impl Into<String>,
        capacity: u32,
        member_ids: Vec<MemberId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
            occupancy: member_ids.len() as u32,
            member_ids,
            debt: 0.0,
        }
    }

    /// Returns whether this room's roster has exactly one member.
    ///
    /// Singleton rooms are exempt from the no-consecutive rule.
    pub fn is_singleton(&self) -> bool {
        self.member_ids.len() == 1
    }
}

/// One person in the rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub room_id: RoomId,
    /// Lifetime count of assignments received. Monotonically increasing.
    #[serde(default)]
    pub assignment_count: u32,
    /// Last persisted fairness debt. Informational only: the scheduler
    /// recomputes member debt from raw counters on every run.
    #[serde(default)]
    pub debt: f64,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>, room_id: impl Into<RoomId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            room_id: room_id.into(),
            assignment_count: 0,
            debt: 0.0,
        }
    }
}

/// Bulk provisioning payload: everything needed to create a household once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub chores: Vec<Chore>,
    pub rooms: Vec<Room>,
    pub members: Vec<Member>,
}
