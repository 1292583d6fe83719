//! Slot allocation stage.
//!
//! Greedy repeated maximum over room debt: each of `chore_count` iterations
//! awards one slot to the room with the highest debt and charges it 1.
//! Ties go to the room scanned first.

use crate::scheduler::context::RoomState;
use log::debug;

/// Distributes `chore_count` indivisible slots across rooms.
///
/// Returns the number of slots awarded, which equals `chore_count` unless no
/// room has any occupancy. Rooms with zero occupancy are never candidates.
pub fn allocate_slots(rooms: &mut [RoomState<'_>], chore_count: usize) -> usize {
    let mut awarded = 0;
    for _ in 0..chore_count {
        let Some(index) = highest_debt_room(rooms) else {
            break;
        };
        let state = &mut rooms[index];
        state.slots += 1;
        state.debt -= 1.0;
        awarded += 1;
    }

    for state in rooms.iter().filter(|state| state.slots > 0) {
        debug!(
            "event=slot_allocated module=scheduler room_id={} slots={} debt={:.4}",
            state.room.id, state.slots, state.debt
        );
    }
    awarded
}

fn highest_debt_room(rooms: &[RoomState<'_>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, state) in rooms.iter().enumerate() {
        if state.room.occupancy == 0 {
            continue;
        }
        match best {
            Some((_, debt)) if state.debt <= debt => {}
            _ => best = Some((index, state.debt)),
        }
    }
    best.map(|(index, _)| index)
}
