//! Cycle generation use-case service.
//!
//! # Responsibility
//! - Run one cycle: existence guard, snapshot read, planning, atomic commit.
//! - Join committed picks with display names for callers.
//!
//! # Invariants
//! - Any failure before the commit leaves storage untouched.
//! - A cycle id is generated once per run; reusing an existing id is rejected
//!   both by the pre-check and by the conditional insert at commit time.

use crate::config::{ConfigError, SchedulerConfig};
use crate::model::cycle::{assignment_id, Assignment, AssignmentStatus, Cycle, CycleId};
use crate::model::snapshot::CatalogSnapshot;
use crate::repo::household_repo::{AssignmentView, CycleCommit, HouseholdRepository, RepoError};
use crate::scheduler::error::ScheduleError;
use crate::scheduler::{enter_phase, plan_cycle, CyclePhase, CyclePlan};
use chrono::{DateTime, Local, TimeZone, Utc};
use log::{error, info};
use rand::Rng;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const CYCLE_ID_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Produces a new cycle id per invocation.
pub trait CycleIdGenerator {
    fn next_cycle_id(&mut self) -> CycleId;
}

/// Cycle ids from the local wall clock at second resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockCycleIds;

impl CycleIdGenerator for ClockCycleIds {
    fn next_cycle_id(&mut self) -> CycleId {
        format_cycle_id(&Local::now())
    }
}

/// Formats `at` as `YYYY-MM-DD_HHMMSS`, which sorts lexicographically.
pub fn format_cycle_id<Tz: TimeZone>(at: &DateTime<Tz>) -> CycleId
where
    Tz::Offset: std::fmt::Display,
{
    at.format(CYCLE_ID_FORMAT).to_string()
}

/// Errors from cycle use-cases.
#[derive(Debug)]
pub enum CycleServiceError {
    /// Deployment constants are unusable.
    Config(ConfigError),
    /// A cycle with this id was already generated.
    CycleAlreadyExists(CycleId),
    /// Requested cycle does not exist.
    CycleNotFound(CycleId),
    /// Validation or allocation failure.
    Schedule(ScheduleError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl CycleServiceError {
    /// Stable machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "invalid_config",
            Self::CycleAlreadyExists(_) => "cycle_already_exists",
            Self::CycleNotFound(_) => "cycle_not_found",
            Self::Schedule(err) => err.code(),
            Self::Repo(_) => "repo_error",
        }
    }
}

impl Display for CycleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::CycleAlreadyExists(id) => write!(f, "cycle {id} already exists"),
            Self::CycleNotFound(id) => write!(f, "cycle not found: {id}"),
            Self::Schedule(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CycleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Schedule(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for CycleServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ScheduleError> for CycleServiceError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

impl From<RepoError> for CycleServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CycleConflict(id) => Self::CycleAlreadyExists(id),
            other => Self::Repo(other),
        }
    }
}

/// Result of one generated cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycle_id: CycleId,
    pub sequence: u64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Picks in room order with display names.
    pub assignments: Vec<AssignmentView>,
}

impl CycleSummary {
    /// Returns whether any pick needed the no-consecutive rule waived.
    pub fn relaxation_fired(&self) -> bool {
        self.assignments.iter().any(|assignment| assignment.relaxed)
    }
}

/// Cycle service facade over repository implementations.
pub struct CycleService<R: HouseholdRepository, G: CycleIdGenerator = ClockCycleIds> {
    repo: R,
    config: SchedulerConfig,
    ids: G,
}

impl<R: HouseholdRepository> CycleService<R> {
    /// Creates a service that names cycles after the wall clock.
    pub fn new(repo: R, config: SchedulerConfig) -> Self {
        Self::with_id_generator(repo, config, ClockCycleIds)
    }
}

impl<R: HouseholdRepository, G: CycleIdGenerator> CycleService<R, G> {
    pub fn with_id_generator(repo: R, config: SchedulerConfig, ids: G) -> Self {
        Self { repo, config, ids }
    }

    /// Generates the next cycle with a fresh id and a fresh chore shuffle.
    pub fn generate_cycle(&mut self) -> Result<CycleSummary, CycleServiceError> {
        let cycle_id = self.ids.next_cycle_id();
        let mut rng = rand::rng();
        self.generate_cycle_with_id(&cycle_id, &mut rng)
    }

    /// Generates a cycle under a caller-supplied id.
    ///
    /// # Errors
    /// - `CycleAlreadyExists` when `cycle_id` was generated before; nothing is
    ///   written in that case.
    /// - `Schedule` for validation or allocation failures.
    /// - `Repo` when reading or the atomic commit fails.
    pub fn generate_cycle_with_id<Rn: Rng + ?Sized>(
        &self,
        cycle_id: &str,
        rng: &mut Rn,
    ) -> Result<CycleSummary, CycleServiceError> {
        let started_at = Instant::now();
        info!("event=cycle_generate module=service status=start cycle_id={cycle_id}");
        enter_phase(cycle_id, CyclePhase::NotStarted);

        match self.run_cycle(cycle_id, rng) {
            Ok(summary) => {
                enter_phase(cycle_id, CyclePhase::Completed);
                info!(
                    "event=cycle_generate module=service status=ok cycle_id={} sequence={} assignments={} relaxed={} duration_ms={}",
                    cycle_id,
                    summary.sequence,
                    summary.assignments.len(),
                    summary.relaxation_fired(),
                    started_at.elapsed().as_millis()
                );
                Ok(summary)
            }
            Err(err) => {
                enter_phase(cycle_id, CyclePhase::Aborted);
                error!(
                    "event=cycle_generate module=service status=error cycle_id={} duration_ms={} error_code={} error={}",
                    cycle_id,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Lists one committed cycle's assignments with display names.
    pub fn cycle_assignments(
        &self,
        cycle_id: &str,
    ) -> Result<Vec<AssignmentView>, CycleServiceError> {
        if !self.repo.cycle_exists(cycle_id)? {
            return Err(CycleServiceError::CycleNotFound(cycle_id.to_string()));
        }
        Ok(self.repo.cycle_assignments(cycle_id)?)
    }

    /// Lists committed cycles, oldest first.
    pub fn list_cycles(&self) -> Result<Vec<Cycle>, CycleServiceError> {
        Ok(self.repo.list_cycles()?)
    }

    fn run_cycle<Rn: Rng + ?Sized>(
        &self,
        cycle_id: &str,
        rng: &mut Rn,
    ) -> Result<CycleSummary, CycleServiceError> {
        self.config.validate()?;
        if self.repo.cycle_exists(cycle_id)? {
            return Err(CycleServiceError::CycleAlreadyExists(cycle_id.to_string()));
        }

        let snapshot = self.repo.load_snapshot()?;
        let sequence = snapshot.next_sequence();
        let plan = plan_cycle(&snapshot, cycle_id, &self.config, rng)?;

        enter_phase(cycle_id, CyclePhase::Committing);
        let created_at = Utc::now().timestamp_millis();
        let commit = build_commit(&plan, sequence, created_at);
        self.repo.commit_cycle(&commit)?;

        Ok(CycleSummary {
            cycle_id: cycle_id.to_string(),
            sequence,
            created_at,
            assignments: describe(&snapshot, &commit.assignments),
        })
    }
}

fn build_commit(plan: &CyclePlan, sequence: u64, created_at: i64) -> CycleCommit {
    let assignments = plan
        .assignments
        .iter()
        .enumerate()
        .map(|(index, planned)| Assignment {
            id: assignment_id(&plan.cycle_id, index),
            cycle_id: plan.cycle_id.clone(),
            chore_id: planned.chore_id.clone(),
            room_id: planned.room_id.clone(),
            member_id: planned.member_id.clone(),
            status: AssignmentStatus::Assigned,
            relaxed: planned.relaxed,
            created_at,
        })
        .collect::<Vec<_>>();

    CycleCommit {
        cycle: Cycle {
            id: plan.cycle_id.clone(),
            sequence,
            created_at,
            total_chores: assignments.len() as u32,
        },
        assignments,
        rooms: plan.rooms.clone(),
        members: plan.members.clone(),
    }
}

fn describe(snapshot: &CatalogSnapshot, assignments: &[Assignment]) -> Vec<AssignmentView> {
    let rooms: HashMap<&str, &str> = snapshot
        .rooms
        .iter()
        .map(|room| (room.id.as_str(), room.name.as_str()))
        .collect();
    let members: HashMap<&str, &str> = snapshot
        .members
        .iter()
        .map(|member| (member.id.as_str(), member.name.as_str()))
        .collect();
    let chores: HashMap<&str, &str> = snapshot
        .chores
        .iter()
        .map(|chore| (chore.id.as_str(), chore.name.as_str()))
        .collect();

    assignments
        .iter()
        .map(|assignment| AssignmentView {
            assignment_id: assignment.id.clone(),
            room_name: name_or_id(&rooms, &assignment.room_id),
            member_name: name_or_id(&members, &assignment.member_id),
            chore_name: name_or_id(&chores, &assignment.chore_id),
            relaxed: assignment.relaxed,
        })
        .collect()
}

fn name_or_id(names: &HashMap<&str, &str>, id: &str) -> String {
    names.get(id).copied().unwrap_or(id).to_string()
}
