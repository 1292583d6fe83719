//! Debt accrual stage.
//!
//! Room debt is additive and persisted: each run adds the room's fractional
//! share of this run's slots, so rounding remainders carry forward.
//! Member debt is a snapshot recomputed from raw counters on every run and
//! therefore self-corrects regardless of how earlier ties were resolved.

use crate::scheduler::context::RunContext;
use log::debug;

/// Fractional number of this run's slots a room is owed.
pub fn fair_share(occupancy: u32, total_occupancy: u32, chore_count: usize) -> f64 {
    if total_occupancy == 0 {
        return 0.0;
    }
    f64::from(occupancy) / f64::from(total_occupancy) * chore_count as f64
}

/// Expected fair share of `total_assignments` minus what the member received.
pub fn member_debt(total_assignments: usize, total_occupancy: u32, assignment_count: u32) -> f64 {
    if total_occupancy == 0 {
        return 0.0;
    }
    total_assignments as f64 / f64::from(total_occupancy) - f64::from(assignment_count)
}

/// Adds this run's share to every room and recomputes every member's debt.
pub fn accrue(ctx: &mut RunContext<'_>) {
    for state in &mut ctx.rooms {
        state.debt += fair_share(state.room.occupancy, ctx.total_occupancy, ctx.chore_count);
        state.slots = 0;
    }

    for state in ctx.members.values_mut() {
        state.debt = member_debt(
            ctx.total_past_assignments,
            ctx.total_occupancy,
            state.assignment_count,
        );
    }

    debug!(
        "event=debt_accrued module=scheduler cycle_id={} rooms={} members={} past_assignments={}",
        ctx.cycle_id,
        ctx.rooms.len(),
        ctx.members.len(),
        ctx.total_past_assignments
    );
}

#[cfg(test)]
mod tests {
    use super::{fair_share, member_debt};

    #[test]
    fn shares_sum_to_chore_count() {
        let occupancies = [1_u32, 2, 3];
        let total: f64 = occupancies
            .iter()
            .map(|occupancy| fair_share(*occupancy, 6, 6))
            .sum();
        assert!((total - 6.0).abs() < 1e-9);
    }

    #[test]
    fn empty_room_is_owed_nothing() {
        assert_eq!(fair_share(0, 51, 12), 0.0);
        assert_eq!(fair_share(3, 0, 12), 0.0);
    }

    #[test]
    fn member_debt_is_expected_minus_received() {
        assert!((member_debt(12, 6, 0) - 2.0).abs() < 1e-9);
        assert!((member_debt(12, 6, 3) + 1.0).abs() < 1e-9);
        assert_eq!(member_debt(0, 6, 0), 0.0);
    }
}
