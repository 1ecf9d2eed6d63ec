//! Application services for the task queue.

mod queue;

pub use queue::{
    DEFAULT_CANCEL_REASON, PipelineRequest, TaskQueue, TaskQueueError, TaskQueueResult,
};
