//! The agent coordinator as the detector's agent directory.

use crate::agent::domain::{Agent, AgentId, CoordinationState, FileLock};
use crate::agent::ports::{LockMarkerStore, ProjectTree};
use crate::agent::services::{AgentCoordinator, CoordinatorResult};
use crate::conflict::ports::AgentDirectory;
use crate::store::SnapshotStore;
use mockable::Clock;

impl<S, M, T, C> AgentDirectory for AgentCoordinator<S, M, T, C>
where
    S: SnapshotStore<CoordinationState>,
    M: LockMarkerStore,
    T: ProjectTree,
    C: Clock + Send + Sync,
{
    fn agents(&self) -> CoordinatorResult<Vec<Agent>> {
        self.list_agents()
    }

    fn lock_holder(&self, path: &str) -> CoordinatorResult<Option<FileLock>> {
        self.get_lock_info(path)
    }

    fn revoke_claim(&self, agent_id: &AgentId, path: &str) -> CoordinatorResult<bool> {
        Self::revoke_claim(self, agent_id, path)
    }

    fn mark_waiting(&self, agent_id: &AgentId) -> CoordinatorResult<bool> {
        Self::mark_waiting(self, agent_id)
    }
}
