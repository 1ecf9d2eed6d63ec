//! Conflict detection and resolution across agents.
//!
//! The detector scans coordinator state for contested locks, zone
//! violations, same-priority collisions and overlapping pipeline stages,
//! records each finding once, and resolves what it safely can. It owns only
//! the conflict ledger: every change to agents or locks goes back through
//! the [`ports::AgentDirectory`] port.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
