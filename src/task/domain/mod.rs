//! Domain model for the task queue.
//!
//! Task records, the status machine and the dependency graph are plain
//! values; persistence stays outside the domain boundary.

mod error;
mod graph;
mod ids;
mod kind;
mod priority;
mod status;
mod task;

pub use error::{
    ParseTaskPriorityError, ParseTaskStatusError, ParseTaskTypeError, TaskDomainError,
};
pub use graph::{StatusUpdate, TaskGraph, TaskStats};
pub use ids::TaskId;
pub use kind::{PipelineStage, TaskType};
pub use priority::TaskPriority;
pub use status::TaskStatus;
pub use task::{NewTask, Task, TaskMetadata};
