//! Error types for agent domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing agent domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentDomainError {
    /// The agent identifier is empty after trimming.
    #[error("agent identifier must not be empty")]
    EmptyAgentId,

    /// The agent identifier contains whitespace or path separators.
    #[error("invalid agent identifier '{0}'")]
    InvalidAgentId(String),
}

/// Error returned while parsing agent roles.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent role: {0}")]
pub struct ParseAgentRoleError(pub String);

/// Error returned while parsing agent statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent status: {0}")]
pub struct ParseAgentStatusError(pub String);
