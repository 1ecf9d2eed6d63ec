//! In-memory adapters for agent coordination tests.

mod markers;
mod tree;

pub use markers::InMemoryLockMarkers;
pub use tree::InMemoryProjectTree;
