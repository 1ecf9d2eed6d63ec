//! Immutable event records.

use super::{EventId, EventType};
use crate::agent::domain::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Request payload for publishing an event.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub(crate) event_type: EventType,
    pub(crate) source: AgentId,
    pub(crate) data: Value,
    pub(crate) targets: Option<BTreeSet<AgentId>>,
    pub(crate) priority: i32,
    pub(crate) requires_ack: bool,
}

impl PublishRequest {
    /// Creates a broadcast request with an empty payload and priority 0.
    #[must_use]
    pub fn new(event_type: EventType, source: AgentId) -> Self {
        Self {
            event_type,
            source,
            data: Value::Object(serde_json::Map::new()),
            targets: None,
            priority: 0,
            requires_ack: false,
        }
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Restricts delivery to the given agents.
    #[must_use]
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = AgentId>) -> Self {
        self.targets = Some(targets.into_iter().collect());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Asks recipients to acknowledge the event.
    #[must_use]
    pub const fn requiring_ack(mut self) -> Self {
        self.requires_ack = true;
        self
    }
}

/// A published event.
///
/// Everything except the acknowledgement set is fixed at publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    event_id: EventId,
    event_type: EventType,
    source_agent: AgentId,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    target_agents: Option<BTreeSet<AgentId>>,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    requires_ack: bool,
    #[serde(default)]
    acked_by: BTreeSet<AgentId>,
}

impl Event {
    /// Builds an event from a publish request.
    #[must_use]
    pub fn new(request: PublishRequest, timestamp: DateTime<Utc>) -> Self {
        let PublishRequest {
            event_type,
            source,
            data,
            targets,
            priority,
            requires_ack,
        } = request;
        Self {
            event_id: EventId::new(),
            event_type,
            source_agent: source,
            timestamp,
            data,
            target_agents: targets,
            priority,
            requires_ack,
            acked_by: BTreeSet::new(),
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Returns the event type.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Returns the publishing agent.
    #[must_use]
    pub const fn source_agent(&self) -> &AgentId {
        &self.source_agent
    }

    /// Returns the publication time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the payload.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the explicit recipients, or `None` for a broadcast.
    #[must_use]
    pub const fn target_agents(&self) -> Option<&BTreeSet<AgentId>> {
        self.target_agents.as_ref()
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns whether recipients must acknowledge the event.
    #[must_use]
    pub const fn requires_ack(&self) -> bool {
        self.requires_ack
    }

    /// Returns the agents that acknowledged the event.
    #[must_use]
    pub const fn acked_by(&self) -> &BTreeSet<AgentId> {
        &self.acked_by
    }

    /// Returns whether the event is broadcast.
    #[must_use]
    pub const fn is_broadcast(&self) -> bool {
        self.target_agents.is_none()
    }

    /// Returns whether `agent` is a recipient: every agent receives a
    /// broadcast, otherwise only listed targets do.
    #[must_use]
    pub fn is_for(&self, agent: &AgentId) -> bool {
        self.target_agents
            .as_ref()
            .is_none_or(|targets| targets.contains(agent))
    }

    /// Returns whether every required acknowledgement has arrived.
    ///
    /// Targeted events need one from each target; broadcasts need at least
    /// one. Events that do not require acknowledgement are always fully
    /// acknowledged.
    #[must_use]
    pub fn is_fully_acked(&self) -> bool {
        if !self.requires_ack {
            return true;
        }
        match &self.target_agents {
            Some(targets) => targets.is_subset(&self.acked_by),
            None => !self.acked_by.is_empty(),
        }
    }

    /// Returns whether the event awaits an acknowledgement from `agent`.
    #[must_use]
    pub fn awaits_ack_from(&self, agent: &AgentId) -> bool {
        self.requires_ack
            && self
                .target_agents
                .as_ref()
                .is_some_and(|targets| targets.contains(agent))
            && !self.acked_by.contains(agent)
    }

    /// Records an acknowledgement. Returns `false` when the event does not
    /// require one or `agent` is not a recipient.
    pub(crate) fn acknowledge(&mut self, agent: &AgentId) -> bool {
        if !self.requires_ack || !self.is_for(agent) {
            return false;
        }
        self.acked_by.insert(agent.clone());
        true
    }
}
