//! Application services for agent coordination.

mod coordinator;

pub use coordinator::{
    AcquireLockRequest, AgentCoordinator, CoordinationFinding, CoordinatorError,
    CoordinatorResult, LockAcquisition, RegisterAgentRequest, TaskSuggestion,
};
