//! Error types for conflict parsing.

use thiserror::Error;

/// Error returned while parsing conflict types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown conflict type: {0}")]
pub struct ParseConflictTypeError(pub String);

/// Error returned while parsing resolution strategies.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown resolution strategy: {0}")]
pub struct ParseResolutionStrategyError(pub String);
