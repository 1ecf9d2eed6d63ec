//! Agent roles and runtime status.

use super::{ParseAgentRoleError, ParseAgentStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed roles in the development pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Design, decomposition and contracts.
    Architect,
    /// Implementation.
    Coder,
    /// Code review and quality.
    Reviewer,
    /// Alternatives, experiments and load testing.
    Researcher,
    /// Human integrator with the final say.
    Coordinator,
}

impl AgentRole {
    /// All roles in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Architect,
        Self::Coder,
        Self::Reviewer,
        Self::Researcher,
        Self::Coordinator,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Architect => "architect",
            Self::Coder => "coder",
            Self::Reviewer => "reviewer",
            Self::Researcher => "researcher",
            Self::Coordinator => "coordinator",
        }
    }
}

impl TryFrom<&str> for AgentRole {
    type Error = ParseAgentRoleError;

    /// Accepts canonical role names and the agent names historically used
    /// for each role (`gemini`, `codex`, `claude`, `glm5`, `human`).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "architect" | "gemini" => Ok(Self::Architect),
            "coder" | "codex" => Ok(Self::Coder),
            "reviewer" | "claude" => Ok(Self::Reviewer),
            "researcher" | "glm5" => Ok(Self::Researcher),
            "coordinator" | "human" => Ok(Self::Coordinator),
            _ => Err(ParseAgentRoleError(value.to_owned())),
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime status reported by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Registered with nothing to do.
    #[default]
    Idle,
    /// Actively editing.
    Working,
    /// Queued behind another agent.
    Waiting,
    /// Unable to proceed.
    Blocked,
    /// Not reachable.
    Offline,
}

impl AgentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Waiting => "waiting",
            Self::Blocked => "blocked",
            Self::Offline => "offline",
        }
    }
}

impl TryFrom<&str> for AgentStatus {
    type Error = ParseAgentStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "idle" => Ok(Self::Idle),
            "working" => Ok(Self::Working),
            "waiting" => Ok(Self::Waiting),
            "blocked" => Ok(Self::Blocked),
            "offline" => Ok(Self::Offline),
            _ => Err(ParseAgentStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
