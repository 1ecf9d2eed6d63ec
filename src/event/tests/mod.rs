//! Unit tests for the event bus.

mod bus_tests;
mod domain_tests;
mod log_tests;

use crate::agent::domain::AgentId;

fn agent(value: &str) -> AgentId {
    AgentId::new(value).unwrap_or_else(|err| panic!("invalid test id {value}: {err}"))
}
