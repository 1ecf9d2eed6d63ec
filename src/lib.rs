//! Atelier: coordination core for agents editing one source tree.
//!
//! Agents with fixed roles register, lock files before editing them, pull
//! ready work from a dependency-aware queue, and exchange notifications over
//! an event bus. A conflict detector scans agent state for contention and
//! settles the routine cases.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (files, memory)
//! - **Services**: Orchestration over ports with an injected clock
//!
//! # Modules
//!
//! - [`store`]: Snapshot documents shared across processes
//! - [`agent`]: Agent registry, file locks and role zones
//! - [`event`]: Publish/subscribe bus with acknowledgements
//! - [`task`]: Dependency-aware priority task queue
//! - [`conflict`]: Conflict detection and resolution
//! - [`config`]: Coordination settings
//! - [`context`]: The four services wired together

pub mod agent;
pub mod config;
pub mod conflict;
pub mod context;
pub mod event;
pub mod store;
pub mod task;

#[cfg(test)]
mod test_support;
