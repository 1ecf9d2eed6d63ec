//! Port contracts for agent coordination.
//!
//! Ports define infrastructure-agnostic interfaces used by the coordinator.

pub mod markers;
pub mod tree;

pub use markers::{LockMarker, LockMarkerStore, MarkerError, MarkerResult, marker_file_name};
pub use tree::ProjectTree;
