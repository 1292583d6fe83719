//! Typed pre-commit failures of a scheduling run.

use crate::model::household::{MemberId, RoomId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Catalog collection whose size is fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Chores,
    Rooms,
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chores => write!(f, "chores"),
            Self::Rooms => write!(f, "rooms"),
        }
    }
}

/// Why a room's slot could not be filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoEligibleReason {
    /// Room received a slot but has no rostered members.
    EmptyRoster,
    /// Every rostered member was already used this cycle.
    Exhausted,
}

/// Validation and allocation failures. None of them leave partial writes.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Chore or room count differs from the deployment constant.
    CatalogCountMismatch {
        kind: CatalogKind,
        expected: usize,
        found: usize,
    },
    /// Member count differs from summed occupancy, or occupancy is zero.
    OccupancyMismatch {
        member_count: usize,
        total_occupancy: u32,
    },
    /// A member and a room disagree about where the member lives.
    RosterMismatch { room_id: RoomId, member_id: MemberId },
    /// A room's stored occupancy differs from the length of its roster.
    RoomOccupancyMismatch {
        room_id: RoomId,
        occupancy: u32,
        roster_len: usize,
    },
    /// A room's slot cannot be filled even after relaxation.
    NoEligibleMember {
        room_id: RoomId,
        room_name: String,
        reason: NoEligibleReason,
    },
    /// Internal invariant: produced assignment count must equal chore count.
    AllocationCountMismatch { expected: usize, produced: usize },
}

impl ScheduleError {
    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CatalogCountMismatch { .. } => "catalog_count_mismatch",
            Self::OccupancyMismatch { .. } => "occupancy_mismatch",
            Self::RosterMismatch { .. } => "roster_mismatch",
            Self::RoomOccupancyMismatch { .. } => "room_occupancy_mismatch",
            Self::NoEligibleMember { .. } => "no_eligible_member",
            Self::AllocationCountMismatch { .. } => "allocation_count_mismatch",
        }
    }
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CatalogCountMismatch {
                kind,
                expected,
                found,
            } => write!(f, "expected {expected} {kind}, found {found}"),
            Self::OccupancyMismatch {
                total_occupancy: 0, ..
            } => write!(f, "total occupancy is 0; check room records"),
            Self::OccupancyMismatch {
                member_count,
                total_occupancy,
            } => write!(
                f,
                "member count ({member_count}) doesn't match total occupancy ({total_occupancy})"
            ),
            Self::RosterMismatch { room_id, member_id } => write!(
                f,
                "member `{member_id}` is not consistently assigned to room `{room_id}`"
            ),
            Self::RoomOccupancyMismatch {
                room_id,
                occupancy,
                roster_len,
            } => write!(
                f,
                "room `{room_id}` has occupancy {occupancy} but {roster_len} rostered members"
            ),
            Self::NoEligibleMember {
                room_id,
                room_name,
                reason: NoEligibleReason::EmptyRoster,
            } => write!(f, "{room_name} ({room_id}) has no members in its rotation"),
            Self::NoEligibleMember {
                room_id,
                room_name,
                reason: NoEligibleReason::Exhausted,
            } => write!(
                f,
                "could not find eligible member in {room_name} ({room_id}) even with relaxed constraints"
            ),
            Self::AllocationCountMismatch { expected, produced } => write!(
                f,
                "expected {expected} assignments, generated {produced}"
            ),
        }
    }
}

impl Error for ScheduleError {}
