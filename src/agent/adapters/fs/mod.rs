//! Filesystem adapters for agent coordination.

mod markers;
mod tree;

pub use markers::FsLockMarkers;
pub use tree::FsProjectTree;
