//! View of agents and locks the detector reads and acts through.

use crate::agent::domain::{Agent, AgentId, FileLock};
use crate::agent::services::CoordinatorResult;

/// Agent registry access needed to detect and resolve conflicts.
///
/// The detector never edits agent or lock records itself; every change goes
/// through this port.
#[cfg_attr(test, mockall::automock)]
pub trait AgentDirectory: Send + Sync {
    /// Returns every registered agent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::services::CoordinatorError`] when agent state
    /// cannot be read.
    fn agents(&self) -> CoordinatorResult<Vec<Agent>>;

    /// Returns the live lock on `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::services::CoordinatorError`] when agent state
    /// cannot be read or written.
    fn lock_holder(&self, path: &str) -> CoordinatorResult<Option<FileLock>>;

    /// Withdraws the agent's claim on `path`. Returns `false` when it had
    /// none.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::services::CoordinatorError`] when agent state
    /// cannot be written.
    fn revoke_claim(&self, agent_id: &AgentId, path: &str) -> CoordinatorResult<bool>;

    /// Parks the agent in `waiting`. Returns `false` for unknown agents.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::services::CoordinatorError`] when agent state
    /// cannot be written.
    fn mark_waiting(&self, agent_id: &AgentId) -> CoordinatorResult<bool>;
}
