//! Port contracts for conflict detection.

pub mod directory;

pub use directory::AgentDirectory;
