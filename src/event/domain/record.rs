//! Lines of the event log.

use super::{Event, EventId};
use crate::agent::domain::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One agent's acknowledgement of an earlier event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(rename = "ack")]
    event_id: EventId,
    agent_id: AgentId,
    acked_at: DateTime<Utc>,
}

impl Acknowledgement {
    /// Records `agent_id` acknowledging `event_id` at `acked_at`.
    #[must_use]
    pub const fn new(event_id: EventId, agent_id: AgentId, acked_at: DateTime<Utc>) -> Self {
        Self {
            event_id,
            agent_id,
            acked_at,
        }
    }

    /// Returns the acknowledged event.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Returns the acknowledging agent.
    #[must_use]
    pub const fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns when the acknowledgement was made.
    #[must_use]
    pub const fn acked_at(&self) -> DateTime<Utc> {
        self.acked_at
    }
}

/// A log line: a published event, or an acknowledgement appended later.
///
/// Event lines are the bare event object. Acknowledgement lines carry an
/// `ack` key naming the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogRecord {
    /// An acknowledgement of an earlier event.
    Acknowledged(Acknowledgement),
    /// A published event.
    Published(Event),
}

impl From<Event> for LogRecord {
    fn from(event: Event) -> Self {
        Self::Published(event)
    }
}

impl From<Acknowledgement> for LogRecord {
    fn from(ack: Acknowledgement) -> Self {
        Self::Acknowledged(ack)
    }
}
