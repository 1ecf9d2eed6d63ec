//! Closed event taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of coordination fact carried by an event.
///
/// Serialized as dotted names such as `lock.acquired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    /// An agent registered.
    #[serde(rename = "agent.registered")]
    AgentRegistered,
    /// An agent unregistered.
    #[serde(rename = "agent.unregistered")]
    AgentUnregistered,
    /// An agent reported a new status.
    #[serde(rename = "agent.status_changed")]
    AgentStatusChanged,
    /// An agent heartbeat.
    #[serde(rename = "agent.heartbeat")]
    AgentHeartbeat,
    /// A task entered the queue.
    #[serde(rename = "task.created")]
    TaskCreated,
    /// A task was assigned.
    #[serde(rename = "task.assigned")]
    TaskAssigned,
    /// Work on a task started.
    #[serde(rename = "task.started")]
    TaskStarted,
    /// A task completed.
    #[serde(rename = "task.completed")]
    TaskCompleted,
    /// A task failed.
    #[serde(rename = "task.failed")]
    TaskFailed,
    /// A task was cancelled.
    #[serde(rename = "task.cancelled")]
    TaskCancelled,
    /// A lock was acquired.
    #[serde(rename = "lock.acquired")]
    LockAcquired,
    /// A lock was released.
    #[serde(rename = "lock.released")]
    LockReleased,
    /// A lock outlived its TTL.
    #[serde(rename = "lock.expired")]
    LockExpired,
    /// A lock request was refused.
    #[serde(rename = "lock.denied")]
    LockDenied,
    /// A file was created.
    #[serde(rename = "file.created")]
    FileCreated,
    /// A file was modified.
    #[serde(rename = "file.modified")]
    FileModified,
    /// A file was deleted.
    #[serde(rename = "file.deleted")]
    FileDeleted,
    /// A pipeline stage started.
    #[serde(rename = "pipeline.stage_started")]
    PipelineStageStarted,
    /// A pipeline stage completed.
    #[serde(rename = "pipeline.stage_completed")]
    PipelineStageCompleted,
    /// A conflict was detected.
    #[serde(rename = "conflict.detected")]
    ConflictDetected,
    /// A conflict was resolved.
    #[serde(rename = "conflict.resolved")]
    ConflictResolved,
    /// A conflict needs a human.
    #[serde(rename = "conflict.escalated")]
    ConflictEscalated,
    /// A process started.
    #[serde(rename = "system.startup")]
    SystemStartup,
    /// A process is shutting down.
    #[serde(rename = "system.shutdown")]
    SystemShutdown,
    /// Operator attention needed.
    #[serde(rename = "system.alert")]
    SystemAlert,
    /// A monitoring subsystem saw an anomaly.
    #[serde(rename = "system.anomaly_detected")]
    AnomalyDetected,
    /// A remediation ran.
    #[serde(rename = "system.healing_executed")]
    HealingExecuted,
}

impl EventType {
    /// Every event type, grouped by category.
    pub const ALL: [Self; 27] = [
        Self::AgentRegistered,
        Self::AgentUnregistered,
        Self::AgentStatusChanged,
        Self::AgentHeartbeat,
        Self::TaskCreated,
        Self::TaskAssigned,
        Self::TaskStarted,
        Self::TaskCompleted,
        Self::TaskFailed,
        Self::TaskCancelled,
        Self::LockAcquired,
        Self::LockReleased,
        Self::LockExpired,
        Self::LockDenied,
        Self::FileCreated,
        Self::FileModified,
        Self::FileDeleted,
        Self::PipelineStageStarted,
        Self::PipelineStageCompleted,
        Self::ConflictDetected,
        Self::ConflictResolved,
        Self::ConflictEscalated,
        Self::SystemStartup,
        Self::SystemShutdown,
        Self::SystemAlert,
        Self::AnomalyDetected,
        Self::HealingExecuted,
    ];

    /// Returns the dotted wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AgentRegistered => "agent.registered",
            Self::AgentUnregistered => "agent.unregistered",
            Self::AgentStatusChanged => "agent.status_changed",
            Self::AgentHeartbeat => "agent.heartbeat",
            Self::TaskCreated => "task.created",
            Self::TaskAssigned => "task.assigned",
            Self::TaskStarted => "task.started",
            Self::TaskCompleted => "task.completed",
            Self::TaskFailed => "task.failed",
            Self::TaskCancelled => "task.cancelled",
            Self::LockAcquired => "lock.acquired",
            Self::LockReleased => "lock.released",
            Self::LockExpired => "lock.expired",
            Self::LockDenied => "lock.denied",
            Self::FileCreated => "file.created",
            Self::FileModified => "file.modified",
            Self::FileDeleted => "file.deleted",
            Self::PipelineStageStarted => "pipeline.stage_started",
            Self::PipelineStageCompleted => "pipeline.stage_completed",
            Self::ConflictDetected => "conflict.detected",
            Self::ConflictResolved => "conflict.resolved",
            Self::ConflictEscalated => "conflict.escalated",
            Self::SystemStartup => "system.startup",
            Self::SystemShutdown => "system.shutdown",
            Self::SystemAlert => "system.alert",
            Self::AnomalyDetected => "system.anomaly_detected",
            Self::HealingExecuted => "system.healing_executed",
        }
    }

    /// Returns the category prefix, e.g. `lock` for `lock.acquired`.
    #[must_use]
    pub fn category(self) -> &'static str {
        let name = self.as_str();
        name.split_once('.').map_or(name, |(category, _)| category)
    }
}

/// Error returned when an event type name is not in the taxonomy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown event type: {0}")]
pub struct ParseEventTypeError(pub String);

impl TryFrom<&str> for EventType {
    type Error = ParseEventTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|event_type| event_type.as_str() == normalized)
            .ok_or_else(|| ParseEventTypeError(value.to_owned()))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
