//! Adapter implementations for agent coordination ports.

pub mod fs;
pub mod memory;
