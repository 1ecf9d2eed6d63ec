//! History query filter.

use super::{Event, EventType};
use crate::agent::domain::AgentId;
use chrono::{DateTime, Utc};

/// Criteria for selecting events from history. Unset fields match all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    event_type: Option<EventType>,
    source: Option<AgentId>,
    target: Option<AgentId>,
    since: Option<DateTime<Utc>>,
}

impl EventFilter {
    /// Creates a filter matching every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches events of one type.
    #[must_use]
    pub const fn with_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Matches events published by `source`.
    #[must_use]
    pub fn with_source(mut self, source: AgentId) -> Self {
        self.source = Some(source);
        self
    }

    /// Matches events delivered to `target`, broadcasts included.
    #[must_use]
    pub fn with_target(mut self, target: AgentId) -> Self {
        self.target = Some(target);
        self
    }

    /// Matches events published at or after `since`.
    #[must_use]
    pub const fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Returns whether `event` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.event_type.is_none_or(|wanted| event.event_type() == wanted)
            && self
                .source
                .as_ref()
                .is_none_or(|source| event.source_agent() == source)
            && self.target.as_ref().is_none_or(|target| event.is_for(target))
            && self.since.is_none_or(|since| event.timestamp() >= since)
    }
}
