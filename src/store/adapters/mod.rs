//! Snapshot store adapters.

pub mod fs;
pub mod memory;

pub use fs::{JsonFileStore, StateDir};
pub use memory::InMemorySnapshotStore;
