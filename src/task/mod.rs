//! Dependency-aware priority work queue.
//!
//! Tasks form a DAG: a task stays blocked until every task it depends on
//! has completed, and completing a task promotes the dependents it
//! unblocked. Ready work is served strictly by priority, ties broken by
//! insertion order. The queue persists through the shared snapshot store.
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
