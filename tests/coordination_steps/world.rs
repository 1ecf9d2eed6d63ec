//! Shared world state for coordination BDD scenarios.

use crate::test_helpers::ManualClock;
use atelier::agent::domain::AgentId;
use atelier::config::CoordinationConfig;
use atelier::conflict::domain::Conflict;
use atelier::context::{Coordination, MemoryCoordination};
use atelier::event::domain::Event;
use atelier::task::domain::TaskId;
use rstest::fixture;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Scenario world for coordination behaviour tests.
pub struct CoordinationWorld {
    pub coordination: MemoryCoordination<ManualClock>,
    pub clock: ManualClock,
    pub stages: BTreeMap<String, TaskId>,
    pub last_lock: Option<bool>,
    pub event: Option<Event>,
    pub conflicts: Vec<Conflict>,
    pub purged: Option<usize>,
}

impl CoordinationWorld {
    /// Creates a world over an empty in-memory context.
    #[must_use]
    pub fn new() -> Self {
        let clock = ManualClock::new();
        let coordination =
            Coordination::in_memory(CoordinationConfig::default(), Arc::new(clock.clone()));
        Self {
            coordination,
            clock,
            stages: BTreeMap::new(),
            last_lock: None,
            event: None,
            conflicts: Vec::new(),
            purged: None,
        }
    }

    /// Returns the pipeline task created for `stage`.
    pub fn stage(&self, stage: &str) -> Result<TaskId, eyre::Report> {
        self.stages
            .get(stage)
            .copied()
            .ok_or_else(|| eyre::eyre!("no pipeline stage named {stage}"))
    }
}

impl Default for CoordinationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> CoordinationWorld {
    CoordinationWorld::default()
}

/// Parses an agent identifier used in a step.
pub fn agent(value: &str) -> Result<AgentId, eyre::Report> {
    AgentId::new(value).map_err(|err| eyre::eyre!("invalid agent id {value}: {err}"))
}
