//! Error types for task domain validation and parsing.

use super::TaskId;
use thiserror::Error;

/// Errors returned while constructing or inserting tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// A task with this identifier already exists.
    #[error("task {0} already exists")]
    DuplicateTask(TaskId),

    /// The task lists itself as a dependency.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    /// Inserting the task would close a dependency cycle.
    #[error("task {0} would create a dependency cycle")]
    DependencyCycle(TaskId),
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task type: {0}")]
pub struct ParseTaskTypeError(pub String);

/// Error returned for priority values outside 0-4.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("task priority must be between 0 and 4, got {0}")]
pub struct ParseTaskPriorityError(pub u8);
