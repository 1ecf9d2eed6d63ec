//! Agent registry, file locks and per-role access zones.
//!
//! The coordinator is the sole owner of agent records and the lock table.
//! Agents register, heartbeat, report status, and acquire a lock on every
//! path before editing it. The module follows hexagonal architecture:
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
