//! Persisted conflict history.

use super::{Conflict, ConflictId, NewConflict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot owned by the conflict detector: every conflict ever recorded,
/// in detection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictLedger {
    #[serde(default, deserialize_with = "crate::store::lenient::vec")]
    conflicts: Vec<Conflict>,
}

impl ConflictLedger {
    /// Returns the open conflict matching `observation`, recording a new one
    /// when there is none.
    pub fn record(&mut self, observation: NewConflict, now: DateTime<Utc>) -> Conflict {
        if let Some(existing) = self
            .conflicts
            .iter()
            .find(|conflict| conflict.describes(&observation))
        {
            return existing.clone();
        }
        let conflict = Conflict::new(observation, now);
        self.conflicts.push(conflict.clone());
        conflict
    }

    /// Returns the conflict with `conflict_id`.
    #[must_use]
    pub fn get(&self, conflict_id: ConflictId) -> Option<&Conflict> {
        self.conflicts
            .iter()
            .find(|conflict| conflict.conflict_id() == conflict_id)
    }

    pub(crate) fn get_mut(&mut self, conflict_id: ConflictId) -> Option<&mut Conflict> {
        self.conflicts
            .iter_mut()
            .find(|conflict| conflict.conflict_id() == conflict_id)
    }

    /// Returns unresolved conflicts in detection order.
    pub fn active(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts
            .iter()
            .filter(|conflict| !conflict.is_resolved())
    }

    /// Returns at most `limit` conflicts, most recently detected first.
    #[must_use]
    pub fn history(&self, limit: usize) -> Vec<&Conflict> {
        let mut sorted: Vec<&Conflict> = self.conflicts.iter().rev().collect();
        sorted.sort_by(|left, right| right.detected_at().cmp(&left.detected_at()));
        sorted.truncate(limit);
        sorted
    }

    /// Returns the number of recorded conflicts.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Returns whether no conflict was ever recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}
