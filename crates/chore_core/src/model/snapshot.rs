//! Full read snapshot a scheduling run operates on.

use crate::model::cycle::{Assignment, Cycle};
use crate::model::household::{Chore, Member, Room};

/// Flat record collections as returned by the catalog reader.
///
/// Order is significant: rooms are scanned in this order for slot
/// allocation and member selection tie-breaks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub chores: Vec<Chore>,
    pub rooms: Vec<Room>,
    pub members: Vec<Member>,
    pub assignments: Vec<Assignment>,
    pub cycles: Vec<Cycle>,
}

impl CatalogSnapshot {
    /// Returns the latest cycle by sequence, skipping `exclude_id`.
    pub fn latest_cycle_excluding(&self, exclude_id: &str) -> Option<&Cycle> {
        self.cycles
            .iter()
            .filter(|cycle| cycle.id != exclude_id)
            .max_by_key(|cycle| cycle.sequence)
    }

    /// Sequence the next cycle committed on top of this snapshot receives.
    ///
    /// Derived from the snapshot itself so a commit can detect that the
    /// ledger moved after the read.
    pub fn next_sequence(&self) -> u64 {
        self.cycles
            .iter()
            .map(|cycle| cycle.sequence)
            .max()
            .unwrap_or(0)
            + 1
    }
}
