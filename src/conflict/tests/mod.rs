//! Unit tests for conflict detection.


use crate::agent::domain::AgentId;

fn agent(value: &str) -> AgentId {
    AgentId::new(value).unwrap_or_else(|err| panic!("invalid test id {value}: {err}"))
}
