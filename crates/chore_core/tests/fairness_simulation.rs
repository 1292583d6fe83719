mod common;

use chore_core::{
    CycleService, HouseholdRepository, SchedulerConfig, SqliteHouseholdRepository,
};
use common::{household, setup};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

const SPREAD: [(&str, &[&str]); 3] = [
    ("room_a", &["a1"]),
    ("room_b", &["b1", "b2"]),
    ("room_c", &["c1", "c2", "c3", "c4", "c5"]),
];

#[test]
fn room_slots_track_occupancy_share_over_many_cycles() {
    let conn = setup(&household(&SPREAD, 3));
    let repo = SqliteHouseholdRepository::try_new(&conn).unwrap();
    let service = CycleService::new(repo, SchedulerConfig::new(3, 3));
    let mut rng = StdRng::seed_from_u64(42);

    let occupancy: HashMap<&str, f64> = [("room_a", 1.0), ("room_b", 2.0), ("room_c", 5.0)]
        .into_iter()
        .collect();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for run in 1..=80_usize {
        let cycle_id = format!("2026-01-01_{run:06}");
        service.generate_cycle_with_id(&cycle_id, &mut rng).unwrap();

        let snapshot = SqliteHouseholdRepository::try_new(&conn)
            .unwrap()
            .load_snapshot()
            .unwrap();
        for assignment in snapshot
            .assignments
            .iter()
            .filter(|assignment| assignment.cycle_id == cycle_id)
        {
            *slots.entry(assignment.room_id.clone()).or_default() += 1;
        }

        for (room_id, occ) in &occupancy {
            let expected = run as f64 * 3.0 * occ / 8.0;
            let actual = slots.get(*room_id).copied().unwrap_or_default() as f64;
            assert!(
                (actual - expected).abs() <= 1.0,
                "run {run}: {room_id} has {actual} slots, expected about {expected}"
            );
        }
    }

    let snapshot = SqliteHouseholdRepository::try_new(&conn)
        .unwrap()
        .load_snapshot()
        .unwrap();
    let counts: Vec<u32> = snapshot
        .members
        .iter()
        .map(|member| member.assignment_count)
        .collect();
    let max = counts.iter().max().copied().unwrap();
    let min = counts.iter().min().copied().unwrap();
    assert!(max - min <= 1, "member counts drifted apart: {counts:?}");
}

#[test]
fn unpicked_member_debt_grows_until_selected() {
    let conn = setup(&household(&[("room_a", &["m1", "m2", "m3", "m4"])], 1));
    let repo = SqliteHouseholdRepository::try_new(&conn).unwrap();
    let service = CycleService::new(repo, SchedulerConfig::new(1, 1));
    let mut rng = StdRng::seed_from_u64(7);

    let mut m4_debts = Vec::new();
    for run in 1..=4 {
        let summary = service
            .generate_cycle_with_id(&format!("c{run}"), &mut rng)
            .unwrap();
        assert_eq!(summary.assignments[0].member_name, format!("M{run}"));

        let snapshot = SqliteHouseholdRepository::try_new(&conn)
            .unwrap()
            .load_snapshot()
            .unwrap();
        let m4 = snapshot
            .members
            .iter()
            .find(|member| member.id == "m4")
            .unwrap();
        m4_debts.push(m4.debt);
    }

    let expected = [0.25, 0.5, 0.75, 0.0];
    for (actual, expected) in m4_debts.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-9, "{m4_debts:?}");
    }
}

#[test]
fn picks_respect_per_cycle_and_consecutive_rules() {
    let layout: [(&str, &[&str]); 3] = [
        ("room_a", &["a1"]),
        ("room_b", &["b1", "b2"]),
        ("room_c", &["c1", "c2", "c3"]),
    ];
    let conn = setup(&household(&layout, 6));
    let repo = SqliteHouseholdRepository::try_new(&conn).unwrap();
    let service = CycleService::new(repo, SchedulerConfig::new(6, 3));
    let mut rng = StdRng::seed_from_u64(3);

    let mut previous: HashMap<String, HashSet<String>> = HashMap::new();
    for run in 1..=20 {
        let cycle_id = format!("c{run:02}");
        service.generate_cycle_with_id(&cycle_id, &mut rng).unwrap();

        let snapshot = SqliteHouseholdRepository::try_new(&conn)
            .unwrap()
            .load_snapshot()
            .unwrap();
        let picks: Vec<_> = snapshot
            .assignments
            .iter()
            .filter(|assignment| assignment.cycle_id == cycle_id)
            .collect();
        assert_eq!(picks.len(), 6);

        let members: HashSet<&str> = picks
            .iter()
            .map(|assignment| assignment.member_id.as_str())
            .collect();
        assert_eq!(members.len(), picks.len(), "run {run} double-booked a member");

        let chores: HashSet<&str> = picks
            .iter()
            .map(|assignment| assignment.chore_id.as_str())
            .collect();
        assert_eq!(chores.len(), 6);

        for assignment in &picks {
            if assignment.room_id == "room_a" {
                assert!(!assignment.relaxed);
                continue;
            }
            let repeated = previous
                .get(&assignment.room_id)
                .is_some_and(|ids| ids.contains(&assignment.member_id));
            assert!(
                !repeated || assignment.relaxed,
                "run {run}: {} repeated without relaxation",
                assignment.member_id
            );
        }

        previous.clear();
        for assignment in &picks {
            previous
                .entry(assignment.room_id.clone())
                .or_default()
                .insert(assignment.member_id.clone());
        }
    }
}
