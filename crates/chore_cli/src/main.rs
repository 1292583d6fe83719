//! Command-line entry point for the chore rotation.
//!
//! # Responsibility
//! - Parse flags and environment overrides.
//! - Open the household database and delegate to `chore_core` services.
//! - Load a household description from JSON for one-time provisioning.
//! - Render results as plain text tables.

use chore_core::db::open_db;
use chore_core::{
    core_version, default_log_level, init_logging, AssignmentView, CycleService, Household,
    HouseholdRepository, SchedulerConfig, SqliteHouseholdRepository,
};
use clap::{Args, Parser, Subcommand};
use log::error;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "chorectl", about = "Fair weekly chore rotation")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// SQLite database holding the household.
    #[arg(long, env = "CHORE_DB", global = true)]
    db: Option<PathBuf>,
    /// Absolute directory for rotating log files. Logging is off when unset.
    #[arg(long, env = "CHORE_LOG_DIR", global = true)]
    log_dir: Option<String>,
    /// trace|debug|info|warn|error. Defaults to debug in debug builds, info otherwise.
    #[arg(long, env = "CHORE_LOG_LEVEL", global = true)]
    log_level: Option<String>,
    /// Chores handed out per cycle.
    #[arg(long, env = "CHORE_EXPECTED_CHORES", default_value_t = 12, global = true)]
    expected_chores: usize,
    /// Rooms in the household.
    #[arg(long, env = "CHORE_EXPECTED_ROOMS", default_value_t = 18, global = true)]
    expected_rooms: usize,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create chores, rooms and members from a JSON household file.
    ///
    /// The file holds `chores`, `rooms` (with `occupancy` and ordered
    /// `member_ids`) and `members` arrays. Run once per database.
    Provision { household: PathBuf },
    /// Generate the next cycle and print its assignments.
    Generate,
    /// Print the assignments of one cycle.
    Show { cycle_id: String },
    /// List generated cycles, oldest first.
    Cycles,
    /// Print the core version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let global = cli.global;
    if let Some(log_dir) = global.log_dir.as_deref() {
        let level = global.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    if matches!(cli.command, Command::Version) {
        println!("chore_core version={}", core_version());
        return Ok(());
    }

    let db_path = global
        .db
        .ok_or("no database given; pass --db or set CHORE_DB")?;
    let conn = open_db(&db_path)?;
    let repo = SqliteHouseholdRepository::try_new(&conn)?;
    if let Command::Provision { household } = &cli.command {
        let household = read_household(household)?;
        repo.provision(&household)?;
        println!(
            "Provisioned {} chores, {} rooms, {} members",
            household.chores.len(),
            household.rooms.len(),
            household.members.len()
        );
        return Ok(());
    }

    let config = SchedulerConfig::new(global.expected_chores, global.expected_rooms);
    let mut service = CycleService::new(repo, config);

    match cli.command {
        Command::Generate => {
            let summary = service.generate_cycle()?;
            println!("Generated cycle {} (#{})", summary.cycle_id, summary.sequence);
            print_assignments(&summary.assignments);
            if summary.relaxation_fired() {
                println!("* no-consecutive rule relaxed to fill this slot");
            }
        }
        Command::Show { cycle_id } => {
            let assignments = service.cycle_assignments(&cycle_id)?;
            println!("Cycle {cycle_id}");
            print_assignments(&assignments);
        }
        Command::Cycles => {
            for cycle in service.list_cycles()? {
                println!(
                    "{:>4}  {}  chores={}",
                    cycle.sequence, cycle.id, cycle.total_chores
                );
            }
        }
        Command::Provision { .. } | Command::Version => {}
    }
    Ok(())
}

fn read_household(path: &Path) -> Result<Household, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("cannot read `{}`: {err}", path.display()))?;
    parse_household(&text)
}

fn parse_household(text: &str) -> Result<Household, Box<dyn Error>> {
    Ok(serde_json::from_str(text)?)
}

fn print_assignments(assignments: &[AssignmentView]) {
    let room_width = column_width("Room", assignments.iter().map(|a| a.room_name.as_str()));
    let member_width = column_width("Member", assignments.iter().map(|a| a.member_name.as_str()));

    println!("{:<room_width$}  {:<member_width$}  Chore", "Room", "Member");
    for assignment in assignments {
        let marker = if assignment.relaxed { " *" } else { "" };
        println!(
            "{:<room_width$}  {:<member_width$}  {}{}",
            assignment.room_name, assignment.member_name, assignment.chore_name, marker
        );
    }
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(|value| value.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.len())
}
