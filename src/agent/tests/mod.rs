//! Unit tests for agent coordination.
