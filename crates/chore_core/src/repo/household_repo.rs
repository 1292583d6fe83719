//! Household repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Read the full catalog snapshot a scheduling run needs.
//! - Commit one cycle (header, assignments, counters) in a single transaction.
//! - Provide read models for past cycles.
//!
//! # Invariants
//! - `commit_cycle` reserves the cycle id with a conditional insert inside an
//!   `IMMEDIATE` transaction; a duplicate id rolls back the whole batch.
//! - `commit_cycle` refuses a plan built from a snapshot that is no longer the
//!   latest (another cycle was committed in between).
//! - Snapshot ordering is deterministic: rooms, members and chores by id,
//!   rosters by position, cycles by sequence.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::cycle::{Assignment, AssignmentStatus, Cycle, CycleId};
use crate::model::household::{Chore, Household, Member, Room};
use crate::model::snapshot::CatalogSnapshot;
use crate::scheduler::{MemberUpdate, RoomUpdate};
use log::{error, info};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from household persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// A cycle header with this id already exists.
    CycleConflict(CycleId),
    /// Another cycle was committed after the snapshot was read.
    StaleSnapshot { expected_sequence: u64, actual_sequence: u64 },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted or provided data cannot form a valid household.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::CycleConflict(id) => write!(f, "cycle already exists: {id}"),
            Self::StaleSnapshot {
                expected_sequence,
                actual_sequence,
            } => write!(
                f,
                "snapshot is stale: planned cycle sequence {expected_sequence}, ledger is at {actual_sequence}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "household repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid household data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Everything one successful run writes.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleCommit {
    pub cycle: Cycle,
    pub assignments: Vec<Assignment>,
    pub rooms: Vec<RoomUpdate>,
    pub members: Vec<MemberUpdate>,
}

/// Assignment joined with display names.
///
/// Names fall back to the raw id when the referenced record has no name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentView {
    pub assignment_id: String,
    pub room_name: String,
    pub member_name: String,
    pub chore_name: String,
    pub relaxed: bool,
}

/// Persistence contract consumed by the cycle service.
pub trait HouseholdRepository {
    /// Reads chores, rooms, members, all assignments and all cycle headers.
    fn load_snapshot(&self) -> RepoResult<CatalogSnapshot>;
    /// Reports whether a cycle header with `cycle_id` exists.
    fn cycle_exists(&self, cycle_id: &str) -> RepoResult<bool>;
    /// Applies a whole cycle atomically.
    fn commit_cycle(&self, commit: &CycleCommit) -> RepoResult<()>;
    /// Creates chores, rooms, members and rosters in one transaction.
    fn provision(&self, household: &Household) -> RepoResult<()>;
    /// Lists cycle headers, oldest first.
    fn list_cycles(&self) -> RepoResult<Vec<Cycle>>;
    /// Lists one cycle's assignments joined with names, in id order.
    fn cycle_assignments(&self, cycle_id: &str) -> RepoResult<Vec<AssignmentView>>;
}

/// SQLite-backed household repository.
pub struct SqliteHouseholdRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHouseholdRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl HouseholdRepository for SqliteHouseholdRepository<'_> {
    fn load_snapshot(&self) -> RepoResult<CatalogSnapshot> {
        let chores = query_all(
            self.conn,
            "SELECT id, name FROM chores ORDER BY id ASC;",
            |row| {
                Ok(Chore {
                    id: row.get("id")?,
                    name: row.get("name")?,
                })
            },
        )?;

        let mut rosters: HashMap<String, Vec<String>> = HashMap::new();
        for (room_id, member_id) in query_all(
            self.conn,
            "SELECT room_id, member_id FROM room_rosters ORDER BY room_id ASC, position ASC;",
            |row| Ok((row.get::<_, String>("room_id")?, row.get::<_, String>("member_id")?)),
        )? {
            rosters.entry(room_id).or_default().push(member_id);
        }

        let mut rooms = query_all(
            self.conn,
            "SELECT id, name, capacity, occupancy, debt FROM rooms ORDER BY id ASC;",
            parse_room_row,
        )?;
        for room in &mut rooms {
            room.member_ids = rosters.remove(&room.id).unwrap_or_default();
        }
        if let Some(room_id) = rosters.keys().next() {
            return Err(RepoError::InvalidData(format!(
                "roster references unknown room `{room_id}`"
            )));
        }

        let members = query_all(
            self.conn,
            "SELECT id, name, room_id, assignment_count, debt FROM members ORDER BY id ASC;",
            parse_member_row,
        )?;

        let assignments = query_all(
            self.conn,
            "SELECT a.id AS id, a.cycle_id AS cycle_id, a.chore_id AS chore_id,
                    a.room_id AS room_id, a.member_id AS member_id, a.status AS status,
                    a.relaxed AS relaxed, a.created_at AS created_at
             FROM assignments a
             JOIN cycles c ON c.id = a.cycle_id
             ORDER BY c.sequence ASC, a.id ASC;",
            parse_assignment_row,
        )?;

        let cycles = self.list_cycles()?;

        Ok(CatalogSnapshot {
            chores,
            rooms,
            members,
            assignments,
            cycles,
        })
    }

    fn cycle_exists(&self, cycle_id: &str) -> RepoResult<bool> {
        cycle_exists_in(self.conn, cycle_id)
    }

    fn commit_cycle(&self, commit: &CycleCommit) -> RepoResult<()> {
        let started_at = Instant::now();
        let cycle = &commit.cycle;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if cycle_exists_in(&tx, &cycle.id)? {
            return Err(RepoError::CycleConflict(cycle.id.clone()));
        }
        let actual_sequence = next_sequence(&tx)?;
        if actual_sequence != cycle.sequence {
            return Err(RepoError::StaleSnapshot {
                expected_sequence: cycle.sequence,
                actual_sequence,
            });
        }

        let inserted = tx.execute(
            "INSERT INTO cycles (id, sequence, created_at, total_chores)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO NOTHING;",
            params![
                cycle.id.as_str(),
                to_db_int(cycle.sequence, "cycles.sequence")?,
                cycle.created_at,
                cycle.total_chores,
            ],
        )?;
        if inserted == 0 {
            return Err(RepoError::CycleConflict(cycle.id.clone()));
        }

        for assignment in &commit.assignments {
            tx.execute(
                "INSERT INTO assignments (
                    id, cycle_id, chore_id, room_id, member_id, status, relaxed, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    assignment.id.as_str(),
                    assignment.cycle_id.as_str(),
                    assignment.chore_id.as_str(),
                    assignment.room_id.as_str(),
                    assignment.member_id.as_str(),
                    assignment.status.as_str(),
                    assignment.relaxed,
                    assignment.created_at,
                ],
            )?;
        }

        for room in &commit.rooms {
            let changed = tx.execute(
                "UPDATE rooms SET debt = ?2 WHERE id = ?1;",
                params![room.room_id.as_str(), room.debt],
            )?;
            if changed == 0 {
                return Err(RepoError::InvalidData(format!(
                    "cannot update unknown room `{}`",
                    room.room_id
                )));
            }
        }

        for member in &commit.members {
            let changed = tx.execute(
                "UPDATE members SET assignment_count = ?2, debt = ?3 WHERE id = ?1;",
                params![
                    member.member_id.as_str(),
                    member.assignment_count,
                    member.debt
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::InvalidData(format!(
                    "cannot update unknown member `{}`",
                    member.member_id
                )));
            }
        }

        if let Err(err) = tx.commit() {
            error!(
                "event=cycle_commit module=repo status=error cycle_id={} duration_ms={} error={}",
                cycle.id,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        info!(
            "event=cycle_commit module=repo status=ok cycle_id={} sequence={} assignments={} duration_ms={}",
            cycle.id,
            cycle.sequence,
            commit.assignments.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn provision(&self, household: &Household) -> RepoResult<()> {
        let members_by_id: HashMap<&str, &Member> = household
            .members
            .iter()
            .map(|member| (member.id.as_str(), member))
            .collect();
        for room in &household.rooms {
            for member_id in &room.member_ids {
                match members_by_id.get(member_id.as_str()) {
                    Some(member) if member.room_id == room.id => {}
                    _ => {
                        return Err(RepoError::InvalidData(format!(
                            "roster of room `{}` lists member `{member_id}` who does not live there",
                            room.id
                        )));
                    }
                }
            }
        }
        let rooms_by_id: HashMap<&str, &Room> = household
            .rooms
            .iter()
            .map(|room| (room.id.as_str(), room))
            .collect();
        for member in &household.members {
            let rostered = rooms_by_id
                .get(member.room_id.as_str())
                .is_some_and(|room| room.member_ids.contains(&member.id));
            if !rostered {
                return Err(RepoError::InvalidData(format!(
                    "member `{}` is missing from the roster of room `{}`",
                    member.id, member.room_id
                )));
            }
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for chore in &household.chores {
            tx.execute(
                "INSERT INTO chores (id, name) VALUES (?1, ?2);",
                params![chore.id.as_str(), chore.name.as_str()],
            )?;
        }
        for room in &household.rooms {
            tx.execute(
                "INSERT INTO rooms (id, name, capacity, occupancy, debt)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    room.id.as_str(),
                    room.name.as_str(),
                    room.capacity,
                    room.occupancy,
                    room.debt
                ],
            )?;
        }
        for member in &household.members {
            tx.execute(
                "INSERT INTO members (id, name, room_id, assignment_count, debt)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    member.id.as_str(),
                    member.name.as_str(),
                    member.room_id.as_str(),
                    member.assignment_count,
                    member.debt
                ],
            )?;
        }
        for room in &household.rooms {
            for (position, member_id) in room.member_ids.iter().enumerate() {
                tx.execute(
                    "INSERT INTO room_rosters (room_id, member_id, position) VALUES (?1, ?2, ?3);",
                    params![room.id.as_str(), member_id.as_str(), position as i64],
                )?;
            }
        }
        tx.commit()?;

        info!(
            "event=household_provision module=repo status=ok chores={} rooms={} members={}",
            household.chores.len(),
            household.rooms.len(),
            household.members.len()
        );
        Ok(())
    }

    fn list_cycles(&self) -> RepoResult<Vec<Cycle>> {
        query_all(
            self.conn,
            "SELECT id, sequence, created_at, total_chores FROM cycles ORDER BY sequence ASC;",
            parse_cycle_row,
        )
    }

    fn cycle_assignments(&self, cycle_id: &str) -> RepoResult<Vec<AssignmentView>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                a.id AS assignment_id,
                COALESCE(r.name, a.room_id) AS room_name,
                COALESCE(m.name, a.member_id) AS member_name,
                COALESCE(c.name, a.chore_id) AS chore_name,
                a.relaxed AS relaxed
             FROM assignments a
             LEFT JOIN rooms r ON r.id = a.room_id
             LEFT JOIN members m ON m.id = a.member_id
             LEFT JOIN chores c ON c.id = a.chore_id
             WHERE a.cycle_id = ?1
             ORDER BY a.id ASC;",
        )?;
        let mut rows = stmt.query([cycle_id])?;
        let mut views = Vec::new();
        while let Some(row) = rows.next()? {
            views.push(AssignmentView {
                assignment_id: row.get("assignment_id")?,
                room_name: row.get("room_name")?,
                member_name: row.get("member_name")?,
                chore_name: row.get("chore_name")?,
                relaxed: parse_flag(row.get("relaxed")?, "assignments.relaxed")?,
            });
        }
        Ok(views)
    }
}

fn cycle_exists_in(conn: &Connection, cycle_id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM cycles WHERE id = ?1);",
        [cycle_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn next_sequence(conn: &Connection) -> RepoResult<u64> {
    let max: Option<i64> =
        conn.query_row("SELECT MAX(sequence) FROM cycles;", [], |row| row.get(0))?;
    let current = match max {
        Some(value) => to_u64(value, "cycles.sequence")?,
        None => 0,
    };
    Ok(current + 1)
}

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }
    Ok(items)
}

fn parse_room_row(row: &Row<'_>) -> RepoResult<Room> {
    Ok(Room {
        id: row.get("id")?,
        name: row.get("name")?,
        capacity: to_u32(row.get("capacity")?, "rooms.capacity")?,
        occupancy: to_u32(row.get("occupancy")?, "rooms.occupancy")?,
        member_ids: Vec::new(),
        debt: row.get("debt")?,
    })
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    Ok(Member {
        id: row.get("id")?,
        name: row.get("name")?,
        room_id: row.get("room_id")?,
        assignment_count: to_u32(row.get("assignment_count")?, "members.assignment_count")?,
        debt: row.get("debt")?,
    })
}

fn parse_assignment_row(row: &Row<'_>) -> RepoResult<Assignment> {
    let status_text: String = row.get("status")?;
    let status = AssignmentStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in assignments.status"
        ))
    })?;

    Ok(Assignment {
        id: row.get("id")?,
        cycle_id: row.get("cycle_id")?,
        chore_id: row.get("chore_id")?,
        room_id: row.get("room_id")?,
        member_id: row.get("member_id")?,
        status,
        relaxed: parse_flag(row.get("relaxed")?, "assignments.relaxed")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_cycle_row(row: &Row<'_>) -> RepoResult<Cycle> {
    Ok(Cycle {
        id: row.get("id")?,
        sequence: to_u64(row.get("sequence")?, "cycles.sequence")?,
        created_at: row.get("created_at")?,
        total_chores: to_u32(row.get("total_chores")?, "cycles.total_chores")?,
    })
}

fn parse_flag(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn to_u32(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid counter `{value}` in {column}")))
}

fn to_u64(value: i64, column: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid counter `{value}` in {column}")))
}

fn to_db_int(value: u64, column: &str) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value `{value}` overflows {column}")))
}
