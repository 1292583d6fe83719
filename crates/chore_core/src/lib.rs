//! Fair chore rotation for a household of rooms and members.
//! This crate is the single source of truth for scheduling invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scheduler;
pub mod service;

pub use config::{ConfigError, SchedulerConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::cycle::{Assignment, AssignmentStatus, Cycle, CycleId};
pub use model::household::{Chore, ChoreId, Household, Member, MemberId, Room, RoomId};
pub use model::snapshot::CatalogSnapshot;
pub use repo::household_repo::{
    AssignmentView, CycleCommit, HouseholdRepository, RepoError, RepoResult,
    SqliteHouseholdRepository,
};
pub use scheduler::error::{CatalogKind, NoEligibleReason, ScheduleError};
pub use scheduler::{plan_cycle, CyclePhase, CyclePlan, PlannedAssignment};
pub use service::cycle_service::{
    format_cycle_id, ClockCycleIds, CycleIdGenerator, CycleService, CycleServiceError,
    CycleSummary,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
