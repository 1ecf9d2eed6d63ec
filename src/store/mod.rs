//! Persistent state store shared by every coordination component.
//!
//! Each component owns exactly one JSON document under the state directory
//! and reaches it only through a [`ports::SnapshotStore`]. The filesystem
//! adapter serializes every read-modify-write across processes with an
//! advisory lock and replaces the document by atomic rename, so the last
//! full snapshot always wins for external readers.

pub mod adapters;
pub mod error;
pub mod lenient;
pub mod ports;

pub use error::{StoreError, StoreResult};
pub use ports::{Snapshot, SnapshotStore};

#[cfg(test)]
mod tests;
