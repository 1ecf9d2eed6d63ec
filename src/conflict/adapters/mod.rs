//! Adapter implementations for conflict detection ports.

mod coordinator;
