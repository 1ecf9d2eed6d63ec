//! Conflict record.

use super::{ConflictId, ConflictSeverity, ConflictType};
use crate::agent::domain::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Free-form details attached to a conflict.
pub type ConflictMetadata = serde_json::Map<String, serde_json::Value>;

/// One observation made by a detection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConflict {
    conflict_type: ConflictType,
    agents: BTreeSet<AgentId>,
    path: Option<String>,
    description: String,
    metadata: ConflictMetadata,
}

impl NewConflict {
    /// Creates an observation involving `agents`.
    #[must_use]
    pub fn new(
        conflict_type: ConflictType,
        agents: impl IntoIterator<Item = AgentId>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            conflict_type,
            agents: agents.into_iter().collect(),
            path: None,
            description: description.into(),
            metadata: ConflictMetadata::new(),
        }
    }

    /// Sets the contested path or directory.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attaches one metadata entry.
    #[must_use]
    pub fn with_detail(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_owned(), value);
        self
    }

    /// Returns the conflict type.
    #[must_use]
    pub const fn conflict_type(&self) -> ConflictType {
        self.conflict_type
    }
}

/// A detected conflict between agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    conflict_id: ConflictId,
    conflict_type: ConflictType,
    severity: ConflictSeverity,
    agents: BTreeSet<AgentId>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    description: String,
    detected_at: DateTime<Utc>,
    #[serde(default)]
    resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default)]
    metadata: ConflictMetadata,
}

impl Conflict {
    /// Records an observation; severity follows from the type.
    #[must_use]
    pub fn new(observation: NewConflict, detected_at: DateTime<Utc>) -> Self {
        let NewConflict {
            conflict_type,
            agents,
            path,
            description,
            metadata,
        } = observation;
        Self {
            conflict_id: ConflictId::new(),
            conflict_type,
            severity: conflict_type.severity(),
            agents,
            path,
            description,
            detected_at,
            resolved_at: None,
            resolution: None,
            metadata,
        }
    }

    /// Returns the conflict identifier.
    #[must_use]
    pub const fn conflict_id(&self) -> ConflictId {
        self.conflict_id
    }

    /// Returns the conflict type.
    #[must_use]
    pub const fn conflict_type(&self) -> ConflictType {
        self.conflict_type
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> ConflictSeverity {
        self.severity
    }

    /// Returns the agents involved.
    #[must_use]
    pub const fn agents(&self) -> &BTreeSet<AgentId> {
        &self.agents
    }

    /// Returns the contested path or directory.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns when the conflict was first detected.
    #[must_use]
    pub const fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Returns when the conflict was resolved.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Returns the resolution note.
    #[must_use]
    pub fn resolution(&self) -> Option<&str> {
        self.resolution.as_deref()
    }

    /// Returns the attached details.
    #[must_use]
    pub const fn metadata(&self) -> &ConflictMetadata {
        &self.metadata
    }

    /// Returns whether the conflict has been resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Returns whether this open conflict describes the same situation as
    /// `observation`.
    #[must_use]
    pub fn describes(&self, observation: &NewConflict) -> bool {
        !self.is_resolved()
            && self.conflict_type == observation.conflict_type
            && self.path == observation.path
            && self.agents == observation.agents
    }

    pub(crate) fn resolve(&mut self, now: DateTime<Utc>, note: impl Into<String>) {
        self.resolved_at = Some(now);
        self.resolution = Some(note.into());
    }
}
