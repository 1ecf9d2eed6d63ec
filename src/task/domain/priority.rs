//! Task priority levels.

use super::ParseTaskPriorityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Five ordered priority levels; lower values are more urgent.
///
/// Persisted as the integers 0-4.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum TaskPriority {
    /// Must be done immediately.
    Critical,
    /// Should be done soon.
    High,
    /// Normal priority.
    #[default]
    Medium,
    /// Can wait.
    Low,
    /// Background work.
    Background,
}

impl TaskPriority {
    /// Returns the numeric level, 0 (critical) to 4 (background).
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
            Self::Background => 4,
        }
    }

    /// Returns the next less urgent level, staying at background.
    #[must_use]
    pub const fn lowered(self) -> Self {
        match self {
            Self::Critical => Self::High,
            Self::High => Self::Medium,
            Self::Medium => Self::Low,
            Self::Low | Self::Background => Self::Background,
        }
    }
}

impl From<TaskPriority> for u8 {
    fn from(priority: TaskPriority) -> Self {
        priority.value()
    }
}

impl TryFrom<u8> for TaskPriority {
    type Error = ParseTaskPriorityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Critical),
            1 => Ok(Self::High),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Low),
            4 => Ok(Self::Background),
            other => Err(ParseTaskPriorityError(other)),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.value())
    }
}
