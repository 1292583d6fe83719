//! Member selection stage.
//!
//! For each room's allotted slots, picks the member with the greatest debt
//! who has not been used this cycle and did not serve the room in the
//! previous cycle. Singleton rooms skip the previous-cycle rule. When nobody
//! qualifies, the previous-cycle rule is dropped (relaxation); if that still
//! leaves nobody, the run fails.

use crate::model::household::{MemberId, Room, RoomId};
use crate::scheduler::context::{MemberState, RunContext};
use crate::scheduler::error::{NoEligibleReason, ScheduleError, ScheduleResult};
use log::warn;
use std::collections::{HashMap, HashSet};

/// One filled slot before a chore is paired with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPick {
    pub room_id: RoomId,
    pub member_id: MemberId,
    /// The no-consecutive rule was waived to fill this slot.
    pub relaxed: bool,
}

/// Fills every allotted slot, in room order, and charges the chosen members.
pub fn select_members(ctx: &mut RunContext<'_>) -> ScheduleResult<Vec<MemberPick>> {
    let mut picks = Vec::with_capacity(ctx.chore_count);

    for index in 0..ctx.rooms.len() {
        let room = ctx.rooms[index].room;
        let slots = ctx.rooms[index].slots;
        if slots == 0 {
            continue;
        }
        if room.member_ids.is_empty() {
            return Err(no_eligible(room, NoEligibleReason::EmptyRoster));
        }

        let previous = ctx
            .previous_picks
            .get(room.id.as_str())
            .cloned()
            .unwrap_or_default();
        let singleton = room.is_singleton();

        for _ in 0..slots {
            let strict = best_candidate(room, &ctx.members, &ctx.used_this_cycle, |id| {
                singleton || !previous.contains(id)
            });
            let (member_id, relaxed) = match strict {
                Some(member_id) => (member_id, false),
                None => {
                    let Some(member_id) =
                        best_candidate(room, &ctx.members, &ctx.used_this_cycle, |_| true)
                    else {
                        return Err(no_eligible(room, NoEligibleReason::Exhausted));
                    };
                    warn!(
                        "event=constraint_relaxed module=scheduler cycle_id={} room_id={} member_id={} rule=no_consecutive",
                        ctx.cycle_id, room.id, member_id
                    );
                    (member_id, true)
                }
            };

            ctx.used_this_cycle.insert(member_id);
            if let Some(state) = ctx.members.get_mut(member_id) {
                state.debt -= 1.0;
                state.assignment_count += 1;
            }
            picks.push(MemberPick {
                room_id: room.id.clone(),
                member_id: member_id.to_string(),
                relaxed,
            });
        }
    }

    Ok(picks)
}

fn best_candidate<'a>(
    room: &'a Room,
    members: &HashMap<&'a str, MemberState<'a>>,
    used: &HashSet<&'a str>,
    allowed: impl Fn(&str) -> bool,
) -> Option<&'a str> {
    let mut best: Option<(&'a str, f64)> = None;
    for member_id in &room.member_ids {
        let member_id = member_id.as_str();
        if used.contains(member_id) || !allowed(member_id) {
            continue;
        }
        let Some(state) = members.get(member_id) else {
            continue;
        };
        match best {
            Some((_, debt)) if state.debt <= debt => {}
            _ => best = Some((member_id, state.debt)),
        }
    }
    best.map(|(member_id, _)| member_id)
}

fn no_eligible(room: &Room, reason: NoEligibleReason) -> ScheduleError {
    ScheduleError::NoEligibleMember {
        room_id: room.id.clone(),
        room_name: room.name.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::select_members;
    use crate::config::SchedulerConfig;
    use crate::model::cycle::{Assignment, AssignmentStatus, Cycle};
    use crate::model::household::{Chore, Member, Room};
    use crate::model::snapshot::CatalogSnapshot;
    use crate::scheduler::context::RunContext;
    use crate::scheduler::debt::accrue;
    use crate::scheduler::error::{NoEligibleReason, ScheduleError};

    fn snapshot(rooms: &[(&str, &[&str])], chores: usize) -> CatalogSnapshot {
        let mut snapshot = CatalogSnapshot::default();
        for (room_id, member_ids) in rooms {
            let ids: Vec<String> = member_ids.iter().map(|id| id.to_string()).collect();
            for id in &ids {
                snapshot.members.push(Member::new(id.as_str(), id.as_str(), *room_id));
            }
            snapshot
                .rooms
                .push(Room::with_roster(*room_id, *room_id, ids.len() as u32, ids));
        }
        snapshot.chores = (1..=chores)
            .map(|n| Chore::new(format!("chore_{n:02}"), format!("Chore {n}")))
            .collect();
        snapshot
    }

    fn record_previous(snapshot: &mut CatalogSnapshot, picks: &[(&str, &str)]) {
        snapshot.cycles.push(Cycle {
            id: "prev".to_string(),
            sequence: 1,
            created_at: 0,
            total_chores: picks.len() as u32,
        });
        for (index, (room_id, member_id)) in picks.iter().enumerate() {
            snapshot.assignments.push(Assignment {
                id: format!("prev_a{index}"),
                cycle_id: "prev".to_string(),
                chore_id: format!("chore_{:02}", index + 1),
                room_id: room_id.to_string(),
                member_id: member_id.to_string(),
                status: AssignmentStatus::Assigned,
                relaxed: false,
                created_at: 0,
            });
            if let Some(member) = snapshot.members.iter_mut().find(|m| m.id == *member_id) {
                member.assignment_count += 1;
            }
        }
    }

    #[test]
    fn highest_debt_member_is_chosen_with_first_seen_tie_break() {
        let snapshot = snapshot(&[("r1", &["m1", "m2", "m3"])], 1);
        let config = SchedulerConfig::new(1, 1);
        let mut ctx = RunContext::build(&snapshot, "now", &config).unwrap();
        accrue(&mut ctx);
        ctx.rooms[0].slots = 1;

        let picks = select_members(&mut ctx).unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].member_id, "m1");
        assert!(!picks[0].relaxed);
        assert_eq!(ctx.members["m1"].assignment_count, 1);
        assert!((ctx.members["m1"].debt + 1.0).abs() < 1e-9);
    }

    #[test]
    fn previous_pick_is_skipped_in_multi_member_room() {
        let mut snapshot = snapshot(&[("r1", &["m1", "m2"])], 1);
        record_previous(&mut snapshot, &[("r1", "m1")]);
        // Equal debts: without the rule the tie-break would pick m1 again.
        snapshot.members[0].assignment_count = 0;

        let config = SchedulerConfig::new(1, 1);
        let mut ctx = RunContext::build(&snapshot, "now", &config).unwrap();
        accrue(&mut ctx);
        ctx.rooms[0].slots = 1;

        let picks = select_members(&mut ctx).unwrap();
        assert_eq!(picks[0].member_id, "m2");
        assert!(!picks[0].relaxed);
    }

    #[test]
    fn singleton_room_may_repeat() {
        let mut snapshot = snapshot(&[("solo", &["m1"])], 1);
        record_previous(&mut snapshot, &[("solo", "m1")]);

        let config = SchedulerConfig::new(1, 1);
        let mut ctx = RunContext::build(&snapshot, "now", &config).unwrap();
        accrue(&mut ctx);
        ctx.rooms[0].slots = 1;

        let picks = select_members(&mut ctx).unwrap();
        assert_eq!(picks[0].member_id, "m1");
        assert!(!picks[0].relaxed);
    }

    #[test]
    fn relaxation_fires_when_only_previous_picks_remain() {
        let mut snapshot = snapshot(&[("r1", &["m1", "m2"])], 2);
        record_previous(&mut snapshot, &[("r1", "m1")]);

        let config = SchedulerConfig::new(2, 1);
        let mut ctx = RunContext::build(&snapshot, "now", &config).unwrap();
        accrue(&mut ctx);
        ctx.rooms[0].slots = 2;

        let picks = select_members(&mut ctx).unwrap();
        assert_eq!(picks[0].member_id, "m2");
        assert!(!picks[0].relaxed);
        assert_eq!(picks[1].member_id, "m1");
        assert!(picks[1].relaxed);
    }

    #[test]
    fn exhausted_room_fails_the_run() {
        let snapshot = snapshot(&[("r1", &["m1", "m2"])], 3);
        let config = SchedulerConfig::new(3, 1);
        let mut ctx = RunContext::build(&snapshot, "now", &config).unwrap();
        accrue(&mut ctx);
        ctx.rooms[0].slots = 3;

        let err = select_members(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::NoEligibleMember {
                reason: NoEligibleReason::Exhausted,
                ref room_id,
                ..
            } if room_id == "r1"
        ));
    }

    #[test]
    fn slot_in_room_without_roster_is_reported() {
        let snapshot = snapshot(&[("r1", &["m1"]), ("empty", &[])], 1);
        let config = SchedulerConfig::new(1, 2);
        let mut ctx = RunContext::build(&snapshot, "now", &config).unwrap();
        accrue(&mut ctx);
        ctx.rooms[1].slots = 1;

        let err = select_members(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::NoEligibleMember {
                reason: NoEligibleReason::EmptyRoster,
                ref room_id,
                ..
            } if room_id == "empty"
        ));
    }
}
