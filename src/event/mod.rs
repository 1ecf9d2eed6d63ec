//! Publish/subscribe channel for coordination facts.
//!
//! The bus keeps a bounded in-memory history, mirrors every event to an
//! append-only log, tracks acknowledgements for targeted events, and fans
//! events out to synchronous and asynchronous subscribers. It has no
//! dependency on the coordinator; agents are referred to by identifier
//! only.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
