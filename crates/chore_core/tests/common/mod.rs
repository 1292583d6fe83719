#![allow(dead_code)]

use chore_core::db::open_db_in_memory;
use chore_core::{
    Chore, CycleId, CycleIdGenerator, Household, HouseholdRepository, Member, Room,
    SqliteHouseholdRepository,
};
use rusqlite::Connection;

/// Builds a household from `(room_id, [member_id, ..])` pairs plus
/// `chore_count` numbered chores.
pub fn household(layout: &[(&str, &[&str])], chore_count: usize) -> Household {
    let mut household = Household::default();
    for (room_id, member_ids) in layout {
        let ids: Vec<String> = member_ids.iter().map(|id| id.to_string()).collect();
        for id in &ids {
            household
                .members
                .push(Member::new(id.as_str(), id.to_uppercase(), *room_id));
        }
        let capacity = ids.len() as u32 + 1;
        household.rooms.push(Room::with_roster(
            *room_id,
            format!("Room {room_id}"),
            capacity,
            ids,
        ));
    }
    household.chores = (1..=chore_count)
        .map(|n| Chore::new(format!("chore_{n:02}"), format!("Chore {n}")))
        .collect();
    household
}

/// Opens a migrated in-memory database holding `household`.
pub fn setup(household: &Household) -> Connection {
    let conn = open_db_in_memory().unwrap();
    SqliteHouseholdRepository::try_new(&conn)
        .unwrap()
        .provision(household)
        .unwrap();
    conn
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

/// Deterministic, strictly increasing cycle ids.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: u32,
}

impl CycleIdGenerator for SequentialIds {
    fn next_cycle_id(&mut self) -> CycleId {
        self.next += 1;
        format!("2026-01-01_{:06}", self.next)
    }
}
