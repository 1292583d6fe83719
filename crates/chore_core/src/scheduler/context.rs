//! Per-run scratch state threaded through accrual, allocation and selection.
//!
//! # Invariants
//! - Built only from a snapshot that passed validation.
//! - Discarded at the end of the run; nothing here is persisted directly.

use crate::config::SchedulerConfig;
use crate::model::household::{Member, Room};
use crate::model::snapshot::CatalogSnapshot;
use crate::scheduler::error::{CatalogKind, ScheduleError, ScheduleResult};
use std::collections::{HashMap, HashSet};

/// Working copy of one room's counters.
#[derive(Debug, Clone)]
pub struct RoomState<'a> {
    pub room: &'a Room,
    pub debt: f64,
    pub slots: usize,
}

impl<'a> RoomState<'a> {
    pub fn new(room: &'a Room) -> Self {
        Self {
            room,
            debt: room.debt,
            slots: 0,
        }
    }
}

/// Working copy of one member's counters.
#[derive(Debug, Clone)]
pub struct MemberState<'a> {
    pub member: &'a Member,
    pub debt: f64,
    pub assignment_count: u32,
}

impl<'a> MemberState<'a> {
    pub fn new(member: &'a Member) -> Self {
        Self {
            member,
            debt: 0.0,
            assignment_count: member.assignment_count,
        }
    }
}

/// Mutable state of one scheduling run.
#[derive(Debug)]
pub struct RunContext<'a> {
    pub cycle_id: &'a str,
    pub chore_count: usize,
    pub total_occupancy: u32,
    /// Assignment records from every cycle other than the current one.
    pub total_past_assignments: usize,
    /// Rooms in snapshot order.
    pub rooms: Vec<RoomState<'a>>,
    pub members: HashMap<&'a str, MemberState<'a>>,
    /// Members each room supplied in the immediately preceding cycle.
    pub previous_picks: HashMap<&'a str, HashSet<&'a str>>,
    /// Members already chosen anywhere in this cycle.
    pub used_this_cycle: HashSet<&'a str>,
}

impl<'a> RunContext<'a> {
    /// Validates the snapshot and builds the run state.
    ///
    /// Checks run in this order: chore count, room count, non-zero
    /// occupancy, member count against occupancy, member/room references in
    /// both directions, per-room occupancy against roster length.
    pub fn build(
        snapshot: &'a CatalogSnapshot,
        cycle_id: &'a str,
        config: &SchedulerConfig,
    ) -> ScheduleResult<Self> {
        if snapshot.chores.len() != config.expected_chores {
            return Err(ScheduleError::CatalogCountMismatch {
                kind: CatalogKind::Chores,
                expected: config.expected_chores,
                found: snapshot.chores.len(),
            });
        }
        if snapshot.rooms.len() != config.expected_rooms {
            return Err(ScheduleError::CatalogCountMismatch {
                kind: CatalogKind::Rooms,
                expected: config.expected_rooms,
                found: snapshot.rooms.len(),
            });
        }

        let total_occupancy: u32 = snapshot.rooms.iter().map(|room| room.occupancy).sum();
        if total_occupancy == 0 || snapshot.members.len() != total_occupancy as usize {
            return Err(ScheduleError::OccupancyMismatch {
                member_count: snapshot.members.len(),
                total_occupancy,
            });
        }

        let rooms_by_id: HashMap<&str, &Room> = snapshot
            .rooms
            .iter()
            .map(|room| (room.id.as_str(), room))
            .collect();
        let members: HashMap<&'a str, MemberState<'a>> = snapshot
            .members
            .iter()
            .map(|member| (member.id.as_str(), MemberState::new(member)))
            .collect();

        for member in &snapshot.members {
            let rostered = rooms_by_id
                .get(member.room_id.as_str())
                .is_some_and(|room| room.member_ids.contains(&member.id));
            if !rostered {
                return Err(ScheduleError::RosterMismatch {
                    room_id: member.room_id.clone(),
                    member_id: member.id.clone(),
                });
            }
        }
        for room in &snapshot.rooms {
            for member_id in &room.member_ids {
                let belongs = members
                    .get(member_id.as_str())
                    .is_some_and(|state| state.member.room_id == room.id);
                if !belongs {
                    return Err(ScheduleError::RosterMismatch {
                        room_id: room.id.clone(),
                        member_id: member_id.clone(),
                    });
                }
            }
        }

        for room in &snapshot.rooms {
            if room.occupancy as usize != room.member_ids.len() {
                return Err(ScheduleError::RoomOccupancyMismatch {
                    room_id: room.id.clone(),
                    occupancy: room.occupancy,
                    roster_len: room.member_ids.len(),
                });
            }
        }

        let total_past_assignments = snapshot
            .assignments
            .iter()
            .filter(|assignment| assignment.cycle_id != cycle_id)
            .count();

        let mut previous_picks: HashMap<&'a str, HashSet<&'a str>> = HashMap::new();
        if let Some(previous) = snapshot.latest_cycle_excluding(cycle_id) {
            for assignment in &snapshot.assignments {
                if assignment.cycle_id == previous.id {
                    previous_picks
                        .entry(assignment.room_id.as_str())
                        .or_default()
                        .insert(assignment.member_id.as_str());
                }
            }
        }

        Ok(Self {
            cycle_id,
            chore_count: snapshot.chores.len(),
            total_occupancy,
            total_past_assignments,
            rooms: snapshot.rooms.iter().map(RoomState::new).collect(),
            members,
            previous_picks,
            used_this_cycle: HashSet::new(),
        })
    }

    /// Total slots awarded so far.
    pub fn allocated_slots(&self) -> usize {
        self.rooms.iter().map(|state| state.slots).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::RunContext;
    use crate::config::SchedulerConfig;
    use crate::model::cycle::{Assignment, AssignmentStatus, Cycle};
    use crate::model::household::{Chore, Member, Room};
    use crate::model::snapshot::CatalogSnapshot;
    use crate::scheduler::error::ScheduleError;

    fn two_room_snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            chores: vec![Chore::new("chore_01", "Dishes")],
            rooms: vec![
                Room::with_roster("room_a", "A", 3, vec!["a1".to_string(), "a2".to_string()]),
                Room::with_roster("room_b", "B", 2, vec!["b1".to_string()]),
            ],
            members: vec![
                Member::new("a1", "A1", "room_a"),
                Member::new("a2", "A2", "room_a"),
                Member::new("b1", "B1", "room_b"),
            ],
            ..CatalogSnapshot::default()
        }
    }

    fn build_err(snapshot: &CatalogSnapshot) -> ScheduleError {
        RunContext::build(snapshot, "now", &SchedulerConfig::new(1, 2)).unwrap_err()
    }

    fn roster_mismatch(room_id: &str, member_id: &str) -> ScheduleError {
        ScheduleError::RosterMismatch {
            room_id: room_id.to_string(),
            member_id: member_id.to_string(),
        }
    }

    #[test]
    fn consistent_snapshot_builds() {
        let snapshot = two_room_snapshot();
        let ctx = RunContext::build(&snapshot, "now", &SchedulerConfig::new(1, 2)).unwrap();
        assert_eq!(ctx.total_occupancy, 3);
        assert_eq!(ctx.members.len(), 3);
        assert_eq!(ctx.allocated_slots(), 0);
    }

    #[test]
    fn member_of_unknown_room_is_rejected() {
        let mut snapshot = two_room_snapshot();
        snapshot.members[2].room_id = "room_z".to_string();
        assert_eq!(build_err(&snapshot), roster_mismatch("room_z", "b1"));
    }

    #[test]
    fn member_left_off_their_room_roster_is_rejected() {
        let mut snapshot = two_room_snapshot();
        snapshot.rooms[0].member_ids = vec!["a1".to_string()];
        snapshot.rooms[0].occupancy = 2;
        assert_eq!(build_err(&snapshot), roster_mismatch("room_a", "a2"));
    }

    #[test]
    fn roster_entry_without_member_record_is_rejected() {
        let mut snapshot = two_room_snapshot();
        snapshot.rooms[1].member_ids.push("ghost".to_string());
        snapshot.rooms[1].occupancy = 1;
        assert_eq!(build_err(&snapshot), roster_mismatch("room_b", "ghost"));
    }

    #[test]
    fn roster_entry_living_elsewhere_is_rejected() {
        let mut snapshot = two_room_snapshot();
        snapshot.rooms[1].member_ids.push("a2".to_string());
        assert_eq!(build_err(&snapshot), roster_mismatch("room_b", "a2"));
    }

    #[test]
    fn room_occupancy_must_match_roster_length() {
        let mut snapshot = two_room_snapshot();
        snapshot.rooms[0].occupancy = 1;
        snapshot.rooms[1].occupancy = 2;
        assert_eq!(
            build_err(&snapshot),
            ScheduleError::RoomOccupancyMismatch {
                room_id: "room_a".to_string(),
                occupancy: 1,
                roster_len: 2,
            }
        );
    }

    #[test]
    fn previous_picks_come_from_the_latest_other_cycle() {
        let mut snapshot = two_room_snapshot();
        for (sequence, member_id) in [(1_u64, "a1"), (2, "a2")] {
            let cycle_id = format!("c{sequence}");
            snapshot.cycles.push(Cycle {
                id: cycle_id.clone(),
                sequence,
                created_at: 0,
                total_chores: 1,
            });
            snapshot.assignments.push(Assignment {
                id: format!("{cycle_id}_a01"),
                cycle_id,
                chore_id: "chore_01".to_string(),
                room_id: "room_a".to_string(),
                member_id: member_id.to_string(),
                status: AssignmentStatus::Assigned,
                relaxed: false,
                created_at: 0,
            });
        }

        let ctx = RunContext::build(&snapshot, "c3", &SchedulerConfig::new(1, 2)).unwrap();
        assert_eq!(ctx.total_past_assignments, 2);
        assert_eq!(ctx.previous_picks.len(), 1);
        assert!(ctx.previous_picks["room_a"].contains("a2"));
        assert!(!ctx.previous_picks["room_a"].contains("a1"));
    }
}
