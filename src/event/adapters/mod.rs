//! Adapter implementations for event bus ports.

mod fs;
mod memory;

pub use fs::JsonLinesEventLog;
pub use memory::InMemoryEventLog;
