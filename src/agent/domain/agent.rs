//! Agent record.

use super::{AgentId, AgentRole, AgentStatus};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Free-form metadata attached at registration.
pub type AgentMetadata = serde_json::Map<String, serde_json::Value>;

/// A registered agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    agent_id: AgentId,
    role: AgentRole,
    #[serde(default)]
    status: AgentStatus,
    #[serde(default)]
    current_task: Option<String>,
    #[serde(default)]
    locked_files: BTreeSet<String>,
    last_heartbeat: DateTime<Utc>,
    #[serde(default)]
    metadata: AgentMetadata,
}

impl Agent {
    /// Creates an idle agent whose heartbeat is the current clock time.
    #[must_use]
    pub fn new(
        agent_id: AgentId,
        role: AgentRole,
        metadata: AgentMetadata,
        clock: &impl Clock,
    ) -> Self {
        Self {
            agent_id,
            role,
            status: AgentStatus::Idle,
            current_task: None,
            locked_files: BTreeSet::new(),
            last_heartbeat: clock.utc(),
            metadata,
        }
    }

    /// Returns the agent identifier.
    #[must_use]
    pub const fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns the agent role.
    #[must_use]
    pub const fn role(&self) -> AgentRole {
        self.role
    }

    /// Returns the reported status.
    #[must_use]
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Returns the current task reference, if any.
    #[must_use]
    pub fn current_task(&self) -> Option<&str> {
        self.current_task.as_deref()
    }

    /// Returns the paths this agent holds locks on.
    #[must_use]
    pub const fn locked_files(&self) -> &BTreeSet<String> {
        &self.locked_files
    }

    /// Returns the last heartbeat time.
    #[must_use]
    pub const fn last_heartbeat(&self) -> DateTime<Utc> {
        self.last_heartbeat
    }

    /// Returns the registration metadata.
    #[must_use]
    pub const fn metadata(&self) -> &AgentMetadata {
        &self.metadata
    }

    /// Returns whether the last heartbeat is newer than `timeout` at `now`.
    #[must_use]
    pub fn is_active(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        let Ok(window) = TimeDelta::from_std(timeout) else {
            return true;
        };
        now.signed_duration_since(self.last_heartbeat) < window
    }

    /// Refreshes the heartbeat.
    pub fn touch(&mut self, clock: &impl Clock) {
        self.last_heartbeat = clock.utc();
    }

    /// Sets status and current task, refreshing the heartbeat.
    pub fn report(&mut self, status: AgentStatus, current_task: Option<String>, clock: &impl Clock) {
        self.status = status;
        self.current_task = current_task;
        self.touch(clock);
    }

    pub(crate) fn hold(&mut self, path: impl Into<String>) {
        self.locked_files.insert(path.into());
    }

    pub(crate) fn drop_path(&mut self, path: &str) -> bool {
        self.locked_files.remove(path)
    }

    pub(crate) fn drop_all_paths(&mut self) {
        self.locked_files.clear();
    }
}

/// Returns the top-level directory of a current-task reference: the part
/// before the first `/`, or the whole reference when it has none.
#[must_use]
pub fn top_level_directory(task: &str) -> &str {
    task.split('/').next().unwrap_or(task)
}
