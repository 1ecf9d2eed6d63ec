//! Persisted agent and lock snapshot.

use super::{Agent, AgentId, FileLock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot owned by the coordinator: every agent and every lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinationState {
    /// Registered agents keyed by identifier.
    #[serde(default, deserialize_with = "crate::store::lenient::map")]
    pub agents: BTreeMap<AgentId, Agent>,
    /// Lock table keyed by normalized path.
    #[serde(default, deserialize_with = "crate::store::lenient::map")]
    pub locks: BTreeMap<String, FileLock>,
}

impl CoordinationState {
    /// Removes the lock on `path`, if any, and drops the path from its
    /// holder's held set.
    pub fn remove_lock(&mut self, path: &str) -> Option<FileLock> {
        let lock = self.locks.remove(path)?;
        if let Some(holder) = self.agents.get_mut(lock.agent_id()) {
            holder.drop_path(path);
        }
        Some(lock)
    }

    /// Removes the lock on `path` if it has expired at `now`.
    pub fn remove_if_expired(&mut self, path: &str, now: DateTime<Utc>) -> Option<FileLock> {
        let expired = self.locks.get(path).is_some_and(|lock| lock.is_expired(now));
        if expired { self.remove_lock(path) } else { None }
    }

    /// Removes every expired lock and returns them.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> Vec<FileLock> {
        let expired: Vec<String> = self
            .locks
            .iter()
            .filter(|(_, lock)| lock.is_expired(now))
            .map(|(path, _)| path.clone())
            .collect();
        expired
            .iter()
            .filter_map(|path| self.remove_lock(path))
            .collect()
    }

    /// Removes every lock held by `agent_id` and returns them.
    pub fn remove_locks_held_by(&mut self, agent_id: &AgentId) -> Vec<FileLock> {
        let held: Vec<String> = self
            .locks
            .iter()
            .filter(|(_, lock)| lock.agent_id() == agent_id)
            .map(|(path, _)| path.clone())
            .collect();
        let removed = held
            .iter()
            .filter_map(|path| self.remove_lock(path))
            .collect();
        if let Some(agent) = self.agents.get_mut(agent_id) {
            agent.drop_all_paths();
        }
        removed
    }
}
