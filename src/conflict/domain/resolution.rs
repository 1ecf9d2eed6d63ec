//! Resolution strategies and outcomes.

use super::{ConflictId, ParseResolutionStrategyError};
use crate::agent::domain::AgentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a conflict is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Highest role priority wins; losers give up the contested path.
    Priority,
    /// The current lock holder wins; other claimants give up the path.
    FirstCome,
    /// Role hierarchy decides. Settled exactly like [`Self::Priority`].
    RoleBased,
    /// Earliest heartbeat goes first; the others wait.
    Queue,
    /// Left for a human.
    Manual,
}

impl ResolutionStrategy {
    /// Every strategy.
    pub const ALL: [Self; 5] = [
        Self::Priority,
        Self::FirstCome,
        Self::RoleBased,
        Self::Queue,
        Self::Manual,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::FirstCome => "first_come",
            Self::RoleBased => "role_based",
            Self::Queue => "queue",
            Self::Manual => "manual",
        }
    }
}

impl TryFrom<&str> for ResolutionStrategy {
    type Error = ParseResolutionStrategyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| ParseResolutionStrategyError(value.to_owned()))
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change applied to coordinator state while resolving a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ResolutionAction {
    /// The agent's claim on `path` was withdrawn.
    ReleaseLock {
        /// Losing agent.
        agent_id: AgentId,
        /// Contested path.
        path: String,
    },
    /// The agent was parked in `waiting`.
    SetWaiting {
        /// Queued agent.
        agent_id: AgentId,
        /// Why it waits.
        reason: String,
    },
}

/// Outcome of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// Conflict the attempt applied to.
    pub conflict_id: ConflictId,
    /// Strategy that was applied.
    pub strategy: ResolutionStrategy,
    /// Agent that kept the contested resource, if one was chosen.
    pub winner: Option<AgentId>,
    /// Changes made to coordinator state.
    pub actions: Vec<ResolutionAction>,
    /// Human-readable summary.
    pub message: String,
    /// Whether the conflict is still open and needs a human.
    pub requires_manual: bool,
}

impl ConflictResolution {
    pub(crate) fn manual(
        conflict_id: ConflictId,
        strategy: ResolutionStrategy,
        message: impl Into<String>,
    ) -> Self {
        Self {
            conflict_id,
            strategy,
            winner: None,
            actions: Vec::new(),
            message: message.into(),
            requires_manual: true,
        }
    }
}
