//! Service layer for agent registration, heartbeats and file locks.

use crate::agent::{
    domain::{
        Agent, AgentDomainError, AgentId, AgentMetadata, AgentRole, AgentStatus,
        CoordinationState, DEFAULT_LOCK_TTL, FileLock, FileZone, LockType, PathScope,
        normalize_path, top_level_directory,
    },
    ports::{LockMarker, LockMarkerStore, ProjectTree},
};
use crate::store::{SnapshotStore, StoreError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request payload for registering an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterAgentRequest {
    agent_id: String,
    role: AgentRole,
    metadata: AgentMetadata,
}

impl RegisterAgentRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(agent_id: impl Into<String>, role: AgentRole) -> Self {
        Self {
            agent_id: agent_id.into(),
            role,
            metadata: AgentMetadata::new(),
        }
    }

    /// Sets registration metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: AgentMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Request payload for acquiring a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireLockRequest {
    agent_id: AgentId,
    path: String,
    lock_type: LockType,
    ttl: Duration,
}

impl AcquireLockRequest {
    /// Creates an exclusive lock request with the default one-hour TTL.
    #[must_use]
    pub fn new(agent_id: AgentId, path: impl Into<String>) -> Self {
        Self {
            agent_id,
            path: path.into(),
            lock_type: LockType::Exclusive,
            ttl: DEFAULT_LOCK_TTL,
        }
    }

    /// Sets the lock kind.
    #[must_use]
    pub const fn with_lock_type(mut self, lock_type: LockType) -> Self {
        self.lock_type = lock_type;
        self
    }

    /// Sets the lock lifetime.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Outcome of a lock attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAcquisition {
    /// A new lock was recorded.
    Acquired(FileLock),
    /// The requester already held a live lock; it is returned unchanged.
    AlreadyHeld(FileLock),
    /// The requester is not registered.
    UnknownAgent,
    /// The path is empty after normalization.
    InvalidPath,
    /// The requester's zone does not grant the path.
    ZoneDenied,
    /// Another agent holds a live lock on the path.
    HeldBy(FileLock),
}

impl LockAcquisition {
    /// Returns whether the requester holds the lock after the attempt.
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Acquired(_) | Self::AlreadyHeld(_))
    }
}

/// A potential conflict spotted from the coordinator's own state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinationFinding {
    /// More than one agent lists the same path in its held set.
    MultipleHolders {
        /// Contested path.
        path: String,
        /// Agents listing it.
        agents: Vec<AgentId>,
    },
    /// Agents of equal role priority work under the same top-level
    /// directory.
    SharedDirectory {
        /// Shared top-level directory.
        directory: String,
        /// Agents working there.
        agents: Vec<AgentId>,
        /// Their roles, parallel to `agents`.
        roles: Vec<AgentRole>,
    },
}

/// Hint about where an agent could work next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSuggestion {
    /// Existing, unlocked zone prefix.
    pub path: String,
    /// The agent's zone priority.
    pub priority: u8,
}

/// Service-level errors for coordinator operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] AgentDomainError),
    /// Snapshot persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for coordinator operations.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Agent registry and lock table.
///
/// Unknown agents, denied paths and contested locks are reported as
/// `false`, `None` or an explicit [`LockAcquisition`]; only persistence
/// failures are errors. Lock markers are written and removed only once the
/// snapshot update has persisted.
#[derive(Clone)]
pub struct AgentCoordinator<S, M, T, C>
where
    S: SnapshotStore<CoordinationState>,
    M: LockMarkerStore,
    T: ProjectTree,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    markers: Arc<M>,
    tree: Arc<T>,
    clock: Arc<C>,
}

impl<S, M, T, C> AgentCoordinator<S, M, T, C>
where
    S: SnapshotStore<CoordinationState>,
    M: LockMarkerStore,
    T: ProjectTree,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator without touching persisted state.
    #[must_use]
    pub const fn new(store: Arc<S>, markers: Arc<M>, tree: Arc<T>, clock: Arc<C>) -> Self {
        Self {
            store,
            markers,
            tree,
            clock,
        }
    }

    /// Creates a coordinator and purges locks that expired while no process
    /// was running.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when the snapshot cannot be read
    /// or written.
    pub fn open(
        store: Arc<S>,
        markers: Arc<M>,
        tree: Arc<T>,
        clock: Arc<C>,
    ) -> CoordinatorResult<Self> {
        let coordinator = Self::new(store, markers, tree, clock);
        let purged = coordinator.purge_expired_locks()?;
        let state = coordinator.store.read()?;
        info!(
            agents = state.agents.len(),
            locks = state.locks.len(),
            purged,
            "loaded coordination state"
        );
        Ok(coordinator)
    }

    /// Returns the project tree consulted for suggestions.
    #[must_use]
    pub const fn project_tree(&self) -> &Arc<T> {
        &self.tree
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    fn write_marker(&self, lock: &FileLock) {
        let marker = LockMarker {
            path: lock.path().to_owned(),
            agent_id: lock.agent_id().clone(),
            timestamp: self.now(),
        };
        if let Err(err) = self.markers.write(&marker) {
            warn!(path = %lock.path(), error = %err, "failed to write lock marker");
        }
    }

    fn remove_markers<'a>(&self, locks: impl IntoIterator<Item = &'a FileLock>) {
        for lock in locks {
            if let Err(err) = self.markers.remove(lock.path()) {
                warn!(path = %lock.path(), error = %err, "failed to remove lock marker");
            }
        }
    }

    /// Registers an agent, replacing any record with the same identifier.
    ///
    /// Locks the identifier already holds in the lock table stay in force
    /// and are reflected in the new record's held set.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Domain`] when the identifier is invalid,
    /// or [`CoordinatorError::Store`] when persistence fails.
    pub fn register(&self, request: RegisterAgentRequest) -> CoordinatorResult<Agent> {
        let RegisterAgentRequest {
            agent_id: raw_id,
            role,
            metadata,
        } = request;
        let agent_id = AgentId::new(raw_id)?;
        let mut agent = Agent::new(agent_id.clone(), role, metadata, &*self.clock);

        let registered = self.store.update(move |state| {
            state
                .locks
                .values()
                .filter(|lock| lock.agent_id() == &agent_id)
                .for_each(|lock| agent.hold(lock.path()));
            state.agents.insert(agent_id, agent.clone());
            agent
        })?;
        info!(agent_id = %registered.agent_id(), role = %registered.role(), "registered agent");
        Ok(registered)
    }

    /// Releases every lock the agent holds, then deletes its record.
    ///
    /// Returns `false` when the agent is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn unregister(&self, agent_id: &AgentId) -> CoordinatorResult<bool> {
        let released = self.store.update(|state| {
            if !state.agents.contains_key(agent_id) {
                return None;
            }
            let released = state.remove_locks_held_by(agent_id);
            state.agents.remove(agent_id);
            Some(released)
        })?;
        let Some(locks) = released else {
            return Ok(false);
        };
        self.remove_markers(&locks);
        info!(agent_id = %agent_id, released = locks.len(), "unregistered agent");
        Ok(true)
    }

    /// Refreshes the agent's last-seen time.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn heartbeat(&self, agent_id: &AgentId) -> CoordinatorResult<bool> {
        Ok(self.store.update(|state| {
            state
                .agents
                .get_mut(agent_id)
                .map(|agent| agent.touch(&*self.clock))
                .is_some()
        })?)
    }

    /// Records the agent's status and current task, refreshing its
    /// heartbeat.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn update_agent_status(
        &self,
        agent_id: &AgentId,
        status: AgentStatus,
        current_task: Option<String>,
    ) -> CoordinatorResult<bool> {
        let updated = self.store.update(|state| {
            state
                .agents
                .get_mut(agent_id)
                .map(|agent| agent.report(status, current_task, &*self.clock))
                .is_some()
        })?;
        if updated {
            debug!(agent_id = %agent_id, status = %status, "agent status updated");
        }
        Ok(updated)
    }

    /// Returns whether the agent's zone grants `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when the snapshot cannot be read.
    pub fn can_access(&self, agent_id: &AgentId, raw_path: &str) -> CoordinatorResult<bool> {
        let Some(path) = normalize_path(raw_path) else {
            return Ok(false);
        };
        let state = self.store.read()?;
        Ok(state
            .agents
            .get(agent_id)
            .is_some_and(|agent| FileZone::for_role(agent.role()).can_access(&path)))
    }

    /// Attempts to lock a path and reports exactly why it failed.
    ///
    /// A live lock already held by the requester is returned unchanged; its
    /// acquisition time is not refreshed. An expired lock, whoever held it,
    /// is purged and the path re-acquired.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn try_acquire_lock(&self, request: AcquireLockRequest) -> CoordinatorResult<LockAcquisition> {
        let AcquireLockRequest {
            agent_id,
            path: raw_path,
            lock_type,
            ttl,
        } = request;
        let Some(path) = normalize_path(&raw_path) else {
            return Ok(LockAcquisition::InvalidPath);
        };
        let now = self.now();

        let (outcome, expired) = self.store.update(|state| {
            let Some(role) = state.agents.get(&agent_id).map(Agent::role) else {
                return (LockAcquisition::UnknownAgent, None);
            };
            if !FileZone::for_role(role).can_access(&path) {
                return (LockAcquisition::ZoneDenied, None);
            }
            let expired = state.remove_if_expired(&path, now);
            if let Some(existing) = state.locks.get(&path) {
                let outcome = if existing.agent_id() == &agent_id {
                    LockAcquisition::AlreadyHeld(existing.clone())
                } else {
                    LockAcquisition::HeldBy(existing.clone())
                };
                return (outcome, expired);
            }

            let lock = FileLock::new(path.clone(), agent_id.clone(), lock_type, ttl, now);
            state.locks.insert(path.clone(), lock.clone());
            if let Some(agent) = state.agents.get_mut(&agent_id) {
                agent.hold(path.clone());
            }
            (LockAcquisition::Acquired(lock), expired)
        })?;

        if let Some(stale) = &expired {
            debug!(path = %path, holder = %stale.agent_id(), "purged expired lock");
            self.remove_markers([stale]);
        }
        match &outcome {
            LockAcquisition::Acquired(lock) => {
                self.write_marker(lock);
                info!(agent_id = %agent_id, path = %path, "lock acquired");
            }
            LockAcquisition::UnknownAgent => warn!(agent_id = %agent_id, "unknown agent"),
            LockAcquisition::ZoneDenied => {
                warn!(agent_id = %agent_id, path = %path, "path outside agent zone");
            }
            LockAcquisition::HeldBy(existing) => {
                info!(path = %path, holder = %existing.agent_id(), "path already locked");
            }
            LockAcquisition::AlreadyHeld(_) | LockAcquisition::InvalidPath => {}
        }
        Ok(outcome)
    }

    /// Attempts to lock a path.
    ///
    /// Returns `true` when the requester holds the lock afterwards. Use
    /// [`Self::get_lock_info`] to find the current holder after a denial.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn acquire_lock(&self, request: AcquireLockRequest) -> CoordinatorResult<bool> {
        Ok(self.try_acquire_lock(request)?.is_granted())
    }

    /// Releases a lock. Only the recorded holder can release it.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn release_lock(&self, agent_id: &AgentId, raw_path: &str) -> CoordinatorResult<bool> {
        let Some(path) = normalize_path(raw_path) else {
            return Ok(false);
        };
        let released = self.store.update(|state| {
            let is_holder = state
                .locks
                .get(&path)
                .is_some_and(|lock| lock.agent_id() == agent_id);
            if is_holder {
                state.remove_lock(&path)
            } else {
                None
            }
        })?;
        let Some(lock) = released else {
            return Ok(false);
        };
        self.remove_markers([&lock]);
        info!(agent_id = %agent_id, path = %path, "lock released");
        Ok(true)
    }

    /// Withdraws the agent's claim on `path`: drops it from the agent's
    /// held set and releases the lock table entry if the agent holds it.
    ///
    /// Returns `false` when the agent is unknown or had no claim.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn revoke_claim(&self, agent_id: &AgentId, raw_path: &str) -> CoordinatorResult<bool> {
        let Some(path) = normalize_path(raw_path) else {
            return Ok(false);
        };
        let (revoked, released) = self.store.update(|state| {
            let is_holder = state
                .locks
                .get(&path)
                .is_some_and(|lock| lock.agent_id() == agent_id);
            if is_holder {
                return (true, state.remove_lock(&path));
            }
            let dropped = state
                .agents
                .get_mut(agent_id)
                .is_some_and(|agent| agent.drop_path(&path));
            (dropped, None)
        })?;
        self.remove_markers(&released);
        if revoked {
            info!(agent_id = %agent_id, path = %path, "lock claim revoked");
        }
        Ok(revoked)
    }

    /// Parks the agent in `waiting`, keeping its current task.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn mark_waiting(&self, agent_id: &AgentId) -> CoordinatorResult<bool> {
        let parked = self.store.update(|state| {
            state
                .agents
                .get_mut(agent_id)
                .map(|agent| {
                    let task = agent.current_task().map(ToOwned::to_owned);
                    agent.report(AgentStatus::Waiting, task, &*self.clock);
                })
                .is_some()
        })?;
        if parked {
            debug!(agent_id = %agent_id, "agent queued as waiting");
        }
        Ok(parked)
    }

    /// Releases every lock held by the agent and returns how many there
    /// were.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn release_all_locks(&self, agent_id: &AgentId) -> CoordinatorResult<usize> {
        let released = self.store.update(|state| state.remove_locks_held_by(agent_id))?;
        self.remove_markers(&released);
        debug!(agent_id = %agent_id, released = released.len(), "released all locks");
        Ok(released.len())
    }

    /// Returns the live lock on `path`, purging it first if it has expired.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn get_lock_info(&self, raw_path: &str) -> CoordinatorResult<Option<FileLock>> {
        let Some(path) = normalize_path(raw_path) else {
            return Ok(None);
        };
        let now = self.now();
        let (live, expired) = self.store.update(|state| {
            let expired = state.remove_if_expired(&path, now);
            (state.locks.get(&path).cloned(), expired)
        })?;
        self.remove_markers(&expired);
        Ok(live)
    }

    /// Removes every expired lock and returns how many were purged.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when persistence fails.
    pub fn purge_expired_locks(&self) -> CoordinatorResult<usize> {
        let now = self.now();
        let expired = self.store.update(|state| state.purge_expired(now))?;
        self.remove_markers(&expired);
        let purged = expired.len();
        if purged > 0 {
            info!(purged, "cleaned up expired locks");
        }
        Ok(purged)
    }

    /// Returns the agent record, if registered.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when the snapshot cannot be read.
    pub fn get_agent(&self, agent_id: &AgentId) -> CoordinatorResult<Option<Agent>> {
        Ok(self.store.read()?.agents.get(agent_id).cloned())
    }

    /// Returns every registered agent ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when the snapshot cannot be read.
    pub fn list_agents(&self) -> CoordinatorResult<Vec<Agent>> {
        Ok(self.store.read()?.agents.into_values().collect())
    }

    /// Returns agents whose last heartbeat is newer than `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when the snapshot cannot be read.
    pub fn active_agents(&self, timeout: Duration) -> CoordinatorResult<Vec<Agent>> {
        let now = self.now();
        Ok(self
            .store
            .read()?
            .agents
            .into_values()
            .filter(|agent| agent.is_active(timeout, now))
            .collect())
    }

    /// Returns every lock currently recorded, live or not yet purged.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when the snapshot cannot be read.
    pub fn list_locks(&self) -> CoordinatorResult<Vec<FileLock>> {
        Ok(self.store.read()?.locks.into_values().collect())
    }

    /// Scans agent state for paths claimed by several agents and for
    /// equal-priority agents sharing a top-level directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when the snapshot cannot be read.
    pub fn find_conflicts(&self) -> CoordinatorResult<Vec<CoordinationFinding>> {
        let state = self.store.read()?;
        let mut findings = Vec::new();

        let mut holders: BTreeMap<&str, Vec<AgentId>> = BTreeMap::new();
        for agent in state.agents.values() {
            for path in agent.locked_files() {
                holders
                    .entry(path.as_str())
                    .or_default()
                    .push(agent.agent_id().clone());
            }
        }
        findings.extend(
            holders
                .into_iter()
                .filter(|(_, agents)| agents.len() > 1)
                .map(|(path, agents)| CoordinationFinding::MultipleHolders {
                    path: path.to_owned(),
                    agents,
                }),
        );

        let mut directories: BTreeMap<&str, Vec<&Agent>> = BTreeMap::new();
        for agent in state.agents.values() {
            if let Some(task) = agent.current_task() {
                directories
                    .entry(top_level_directory(task))
                    .or_default()
                    .push(agent);
            }
        }
        for (directory, agents) in directories {
            if agents.len() < 2 {
                continue;
            }
            let mut priorities = agents
                .iter()
                .map(|agent| FileZone::for_role(agent.role()).priority());
            let first = priorities.next();
            if priorities.all(|priority| Some(priority) == first) {
                findings.push(CoordinationFinding::SharedDirectory {
                    directory: directory.to_owned(),
                    agents: agents.iter().map(|agent| agent.agent_id().clone()).collect(),
                    roles: agents.iter().map(|agent| agent.role()).collect(),
                });
            }
        }
        Ok(findings)
    }

    /// Suggests the first allowed zone prefix that exists under the project
    /// root and is not currently locked.
    ///
    /// The suggestion is a hint and reserves nothing. Agents whose zone
    /// grants everything get no suggestion.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when the snapshot cannot be read.
    pub fn suggest_next_task(&self, agent_id: &AgentId) -> CoordinatorResult<Option<TaskSuggestion>> {
        let state = self.store.read()?;
        let Some(agent) = state.agents.get(agent_id) else {
            return Ok(None);
        };
        let zone = FileZone::for_role(agent.role());
        let PathScope::Prefixes(prefixes) = zone.allowed() else {
            return Ok(None);
        };
        let now = self.now();
        Ok(prefixes
            .iter()
            .filter(|prefix| self.tree.exists(prefix))
            .find(|prefix| {
                state
                    .locks
                    .get(**prefix)
                    .is_none_or(|lock| lock.is_expired(now))
            })
            .map(|prefix| TaskSuggestion {
                path: (*prefix).to_owned(),
                priority: zone.priority(),
            }))
    }
}
