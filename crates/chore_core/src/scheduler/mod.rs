//! Fair rotation scheduler.
//!
//! # Responsibility
//! - Turn a catalog snapshot into a proposed assignment set plus updated
//!   fairness counters.
//! - Run debt accrual, slot allocation and member selection in strict
//!   sequence over one explicit `RunContext`.
//!
//! # Invariants
//! - Pure logic: no I/O. Persistence happens only after a plan is returned.
//! - Randomness touches chore-to-slot pairing only; which rooms and members
//!   are chosen is fully determined by the snapshot.
//! - A returned plan always holds exactly `chore_count` assignments with no
//!   member repeated.

pub mod allocation;
pub mod context;
pub mod debt;
pub mod error;
pub mod selection;

use crate::config::SchedulerConfig;
use crate::model::household::{ChoreId, MemberId, RoomId};
use crate::model::snapshot::CatalogSnapshot;
use context::RunContext;
use error::{ScheduleError, ScheduleResult};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

/// Stage a cycle run is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    NotStarted,
    Validating,
    Allocating,
    Selecting,
    Committing,
    Completed,
    Aborted,
}

impl CyclePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Validating => "validating",
            Self::Allocating => "allocating",
            Self::Selecting => "selecting",
            Self::Committing => "committing",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    /// Returns whether the run can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

pub(crate) fn enter_phase(cycle_id: &str, phase: CyclePhase) {
    debug!(
        "event=cycle_phase module=scheduler cycle_id={} phase={}",
        cycle_id,
        phase.as_str()
    );
}

/// One chore given to one member of one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAssignment {
    pub chore_id: ChoreId,
    pub room_id: RoomId,
    pub member_id: MemberId,
    pub relaxed: bool,
}

/// Counters to persist for a room.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomUpdate {
    pub room_id: RoomId,
    pub debt: f64,
    /// Slots the room received this run.
    pub slots: usize,
}

/// Counters to persist for a member.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberUpdate {
    pub member_id: MemberId,
    pub assignment_count: u32,
    /// Debt measured against the history including this run.
    pub debt: f64,
}

/// Speculative result of a run, applied atomically by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclePlan {
    pub cycle_id: String,
    pub total_past_assignments: usize,
    /// In room order, then slot order.
    pub assignments: Vec<PlannedAssignment>,
    /// Every room, in snapshot order.
    pub rooms: Vec<RoomUpdate>,
    /// Every member, in snapshot order.
    pub members: Vec<MemberUpdate>,
}

impl CyclePlan {
    /// Returns whether any slot needed the no-consecutive rule waived.
    pub fn relaxation_fired(&self) -> bool {
        self.assignments.iter().any(|assignment| assignment.relaxed)
    }
}

/// Plans one cycle over `snapshot`.
///
/// `rng` only shuffles which chore lands on which filled slot.
///
/// # Errors
/// - Any `ScheduleError`; nothing is produced on failure.
pub fn plan_cycle<R: Rng + ?Sized>(
    snapshot: &CatalogSnapshot,
    cycle_id: &str,
    config: &SchedulerConfig,
    rng: &mut R,
) -> ScheduleResult<CyclePlan> {
    enter_phase(cycle_id, CyclePhase::Validating);
    let mut ctx = RunContext::build(snapshot, cycle_id, config)?;

    enter_phase(cycle_id, CyclePhase::Allocating);
    debt::accrue(&mut ctx);
    allocation::allocate_slots(&mut ctx.rooms, ctx.chore_count);

    enter_phase(cycle_id, CyclePhase::Selecting);
    let picks = selection::select_members(&mut ctx)?;
    if picks.len() != ctx.chore_count {
        return Err(ScheduleError::AllocationCountMismatch {
            expected: ctx.chore_count,
            produced: picks.len(),
        });
    }

    let mut chores: Vec<&ChoreId> = snapshot.chores.iter().map(|chore| &chore.id).collect();
    chores.shuffle(rng);

    let assignments = picks
        .into_iter()
        .zip(chores)
        .map(|(pick, chore_id)| PlannedAssignment {
            chore_id: chore_id.clone(),
            room_id: pick.room_id,
            member_id: pick.member_id,
            relaxed: pick.relaxed,
        })
        .collect::<Vec<_>>();

    let total_after = ctx.total_past_assignments + assignments.len();
    let rooms = ctx
        .rooms
        .iter()
        .map(|state| RoomUpdate {
            room_id: state.room.id.clone(),
            debt: state.debt,
            slots: state.slots,
        })
        .collect();
    let members = snapshot
        .members
        .iter()
        .filter_map(|member| ctx.members.get(member.id.as_str()))
        .map(|state| MemberUpdate {
            member_id: state.member.id.clone(),
            assignment_count: state.assignment_count,
            debt: debt::member_debt(total_after, ctx.total_occupancy, state.assignment_count),
        })
        .collect();

    Ok(CyclePlan {
        cycle_id: cycle_id.to_string(),
        total_past_assignments: ctx.total_past_assignments,
        assignments,
        rooms,
        members,
    })
}
