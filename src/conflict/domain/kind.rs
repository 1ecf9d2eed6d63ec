//! Conflict categories and severities.

use super::{ParseConflictTypeError, ResolutionStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of contention a conflict records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// More than one agent claims the same path.
    FileLock,
    /// An agent holds a path its zone forbids.
    ZoneViolation,
    /// Equal-priority agents work in the same directory.
    Priority,
    /// Adjacent pipeline stages edit the same files at once.
    Pipeline,
}

impl ConflictType {
    /// Every conflict type.
    pub const ALL: [Self; 4] = [
        Self::FileLock,
        Self::ZoneViolation,
        Self::Priority,
        Self::Pipeline,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileLock => "file_lock",
            Self::ZoneViolation => "zone_violation",
            Self::Priority => "priority",
            Self::Pipeline => "pipeline",
        }
    }

    /// Returns the severity every detection of this type carries.
    #[must_use]
    pub const fn severity(self) -> ConflictSeverity {
        match self {
            Self::FileLock => ConflictSeverity::High,
            Self::ZoneViolation | Self::Pipeline => ConflictSeverity::Medium,
            Self::Priority => ConflictSeverity::Low,
        }
    }

    /// Returns the strategy used when the caller does not pick one.
    #[must_use]
    pub const fn default_strategy(self) -> ResolutionStrategy {
        match self {
            Self::FileLock => ResolutionStrategy::Priority,
            Self::ZoneViolation => ResolutionStrategy::Manual,
            Self::Priority => ResolutionStrategy::Queue,
            Self::Pipeline => ResolutionStrategy::RoleBased,
        }
    }
}

impl TryFrom<&str> for ConflictType {
    type Error = ParseConflictTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseConflictTypeError(value.to_owned()))
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently a conflict needs attention.
///
/// Only low and medium conflicts are resolved automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    /// Can be resolved automatically.
    Low,
    /// Needs coordination; still resolved automatically.
    Medium,
    /// Needs immediate attention.
    High,
    /// Blocks all work.
    Critical,
}

impl ConflictSeverity {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Returns whether `auto_resolve` may act on conflicts of this severity.
    #[must_use]
    pub const fn is_auto_resolvable(self) -> bool {
        matches!(self, Self::Low | Self::Medium)
    }
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
