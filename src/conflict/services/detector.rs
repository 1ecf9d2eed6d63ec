//! Service layer for detecting, recording and resolving conflicts.

use super::passes;
use crate::agent::domain::{Agent, AgentId, FileZone};
use crate::agent::services::CoordinatorError;
use crate::conflict::domain::{
    Conflict, ConflictId, ConflictLedger, ConflictResolution, ResolutionAction,
    ResolutionStrategy,
};
use crate::conflict::ports::AgentDirectory;
use crate::store::{SnapshotStore, StoreError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default number of conflicts returned by history queries.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Service-level errors for conflict operations.
#[derive(Debug, Error)]
pub enum ConflictDetectorError {
    /// Reading or changing agent state failed.
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    /// Ledger persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for conflict operations.
pub type ConflictDetectorResult<T> = Result<T, ConflictDetectorError>;

/// Finds contention between agents and settles what it safely can.
#[derive(Clone)]
pub struct ConflictDetector<S, D, C>
where
    S: SnapshotStore<ConflictLedger>,
    D: AgentDirectory,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    directory: Arc<D>,
    clock: Arc<C>,
}

impl<S, D, C> ConflictDetector<S, D, C>
where
    S: SnapshotStore<ConflictLedger>,
    D: AgentDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a detector over `store`, acting through `directory`.
    #[must_use]
    pub const fn new(store: Arc<S>, directory: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            store,
            directory,
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Runs every detection pass and returns what is currently observed.
    ///
    /// An observation matching an open conflict with the same type, path
    /// and agents returns that record; anything else is recorded as new.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictDetectorError::Coordinator`] when agent state
    /// cannot be read, or [`ConflictDetectorError::Store`] when the ledger
    /// cannot be written.
    pub fn detect_conflicts(&self) -> ConflictDetectorResult<Vec<Conflict>> {
        let agents = self.directory.agents()?;
        let observations = passes::detect_all(&agents);
        if observations.is_empty() {
            return Ok(Vec::new());
        }
        let now = self.now();
        let recorded = self.store.update(|ledger| {
            let before = ledger.len();
            let conflicts: Vec<Conflict> = observations
                .into_iter()
                .map(|observation| ledger.record(observation, now))
                .collect();
            (conflicts, ledger.len().saturating_sub(before))
        })?;
        let (conflicts, fresh) = recorded;
        if fresh > 0 {
            info!(new = fresh, observed = conflicts.len(), "conflicts detected");
        }
        Ok(conflicts)
    }

    /// Resolves an open conflict with `strategy`, or with the default for
    /// its type.
    ///
    /// The conflict is stamped resolved unless the outcome still
    /// `requires_manual`. Returns `None` when the conflict is unknown or
    /// already resolved.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictDetectorError`] when agent state or the ledger
    /// cannot be read or written.
    pub fn resolve_conflict(
        &self,
        conflict_id: ConflictId,
        strategy: Option<ResolutionStrategy>,
    ) -> ConflictDetectorResult<Option<ConflictResolution>> {
        let ledger = self.store.read()?;
        let Some(conflict) = ledger.get(conflict_id).filter(|found| !found.is_resolved()) else {
            return Ok(None);
        };
        let chosen = strategy.unwrap_or_else(|| conflict.conflict_type().default_strategy());
        let resolution = match chosen {
            ResolutionStrategy::Priority | ResolutionStrategy::RoleBased => {
                self.by_priority(conflict, chosen)?
            }
            ResolutionStrategy::FirstCome => self.by_first_come(conflict)?,
            ResolutionStrategy::Queue => self.by_queue(conflict)?,
            ResolutionStrategy::Manual => ConflictResolution::manual(
                conflict_id,
                chosen,
                "This conflict requires manual resolution",
            ),
        };

        if resolution.requires_manual {
            warn!(
                conflict_id = %conflict_id,
                conflict_type = %conflict.conflict_type(),
                "conflict needs manual resolution"
            );
            return Ok(Some(resolution));
        }
        let now = self.now();
        let note = resolution.message.clone();
        self.store.update(|current| {
            if let Some(stored) = current.get_mut(conflict_id) {
                stored.resolve(now, note);
            }
        })?;
        info!(
            conflict_id = %conflict_id,
            strategy = %chosen,
            winner = ?resolution.winner.as_ref().map(AgentId::as_str),
            "conflict resolved"
        );
        Ok(Some(resolution))
    }

    /// Resolves every open low or medium severity conflict with its default
    /// strategy. High and critical conflicts are left for a human.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictDetectorError`] when agent state or the ledger
    /// cannot be read or written.
    pub fn auto_resolve(&self) -> ConflictDetectorResult<Vec<ConflictResolution>> {
        let candidates: Vec<ConflictId> = self
            .store
            .read()?
            .active()
            .filter(|conflict| conflict.severity().is_auto_resolvable())
            .map(Conflict::conflict_id)
            .collect();
        let mut resolutions = Vec::with_capacity(candidates.len());
        for conflict_id in candidates {
            if let Some(resolution) = self.resolve_conflict(conflict_id, None)? {
                resolutions.push(resolution);
            }
        }
        debug!(attempted = resolutions.len(), "auto-resolve sweep finished");
        Ok(resolutions)
    }

    /// Returns a conflict by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictDetectorError::Store`] when the ledger cannot be
    /// read.
    pub fn get_conflict(&self, conflict_id: ConflictId) -> ConflictDetectorResult<Option<Conflict>> {
        Ok(self.store.read()?.get(conflict_id).cloned())
    }

    /// Returns unresolved conflicts in detection order.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictDetectorError::Store`] when the ledger cannot be
    /// read.
    pub fn get_active_conflicts(&self) -> ConflictDetectorResult<Vec<Conflict>> {
        Ok(self.store.read()?.active().cloned().collect())
    }

    /// Returns at most `limit` conflicts, most recently detected first.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictDetectorError::Store`] when the ledger cannot be
    /// read.
    pub fn get_conflict_history(&self, limit: usize) -> ConflictDetectorResult<Vec<Conflict>> {
        Ok(self
            .store
            .read()?
            .history(limit)
            .into_iter()
            .cloned()
            .collect())
    }

    fn involved(&self, conflict: &Conflict) -> ConflictDetectorResult<Vec<Agent>> {
        Ok(self
            .directory
            .agents()?
            .into_iter()
            .filter(|agent| conflict.agents().contains(agent.agent_id()))
            .collect())
    }

    fn revoke_losers<'a>(
        &self,
        losers: impl IntoIterator<Item = &'a AgentId>,
        path: Option<&str>,
    ) -> ConflictDetectorResult<Vec<ResolutionAction>> {
        let Some(contested) = path else {
            return Ok(Vec::new());
        };
        let mut actions = Vec::new();
        for loser in losers {
            if self.directory.revoke_claim(loser, contested)? {
                actions.push(ResolutionAction::ReleaseLock {
                    agent_id: loser.clone(),
                    path: contested.to_owned(),
                });
            }
        }
        Ok(actions)
    }

    fn by_priority(
        &self,
        conflict: &Conflict,
        strategy: ResolutionStrategy,
    ) -> ConflictDetectorResult<ConflictResolution> {
        let agents = self.involved(conflict)?;
        let mut ranked: Vec<(u8, &AgentId)> = agents
            .iter()
            .map(|agent| (FileZone::for_role(agent.role()).priority(), agent.agent_id()))
            .collect();
        // Highest priority first; ties keep identifier order.
        ranked.sort_by(|left, right| right.0.cmp(&left.0).then_with(|| left.1.cmp(right.1)));
        let mut order = ranked.into_iter().map(|(_, agent_id)| agent_id);
        let Some(winner) = order.next() else {
            return Ok(ConflictResolution::manual(
                conflict.conflict_id(),
                strategy,
                "No agents found for resolution",
            ));
        };
        let actions = self.revoke_losers(order, conflict.path())?;
        Ok(ConflictResolution {
            conflict_id: conflict.conflict_id(),
            strategy,
            winner: Some(winner.clone()),
            actions,
            message: format!("Resolved by priority: {winner} has highest priority"),
            requires_manual: false,
        })
    }

    fn by_first_come(&self, conflict: &Conflict) -> ConflictDetectorResult<ConflictResolution> {
        let strategy = ResolutionStrategy::FirstCome;
        let holder = conflict
            .path()
            .map(|path| self.directory.lock_holder(path))
            .transpose()?
            .flatten();
        let Some(lock) = holder else {
            return Ok(ConflictResolution::manual(
                conflict.conflict_id(),
                strategy,
                "Could not determine who acquired the lock first",
            ));
        };
        let winner = lock.agent_id();
        let losers = conflict.agents().iter().filter(|agent_id| *agent_id != winner);
        let actions = self.revoke_losers(losers, conflict.path())?;
        Ok(ConflictResolution {
            conflict_id: conflict.conflict_id(),
            strategy,
            winner: Some(winner.clone()),
            actions,
            message: format!("Resolved by first-come: {winner} acquired the lock first"),
            requires_manual: false,
        })
    }

    fn by_queue(&self, conflict: &Conflict) -> ConflictDetectorResult<ConflictResolution> {
        let strategy = ResolutionStrategy::Queue;
        let mut agents = self.involved(conflict)?;
        agents.sort_by(|left, right| {
            left.last_heartbeat()
                .cmp(&right.last_heartbeat())
                .then_with(|| left.agent_id().cmp(right.agent_id()))
        });
        let mut order = agents.iter().map(Agent::agent_id);
        let Some(winner) = order.next() else {
            return Ok(ConflictResolution::manual(
                conflict.conflict_id(),
                strategy,
                "No agents found for queueing",
            ));
        };
        let mut actions = Vec::new();
        for waiting in order {
            if self.directory.mark_waiting(waiting)? {
                actions.push(ResolutionAction::SetWaiting {
                    agent_id: waiting.clone(),
                    reason: "queued".to_owned(),
                });
            }
        }
        Ok(ConflictResolution {
            conflict_id: conflict.conflict_id(),
            strategy,
            winner: Some(winner.clone()),
            actions,
            message: format!("Resolved by queue: {winner} is first, others waiting"),
            requires_manual: false,
        })
    }
}
