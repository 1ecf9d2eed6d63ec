//! Service layer for the task queue and its five-stage pipeline.

use crate::agent::domain::{AgentId, AgentRole};
use crate::store::{SnapshotStore, StoreError};
use crate::task::domain::{
    NewTask, PipelineStage, StatusUpdate, Task, TaskDomainError, TaskGraph, TaskId, TaskMetadata,
    TaskPriority, TaskStats, TaskStatus, TaskType,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Error recorded on tasks cancelled without a reason.
pub const DEFAULT_CANCEL_REASON: &str = "Cancelled by user";

/// Request payload for creating a design-to-integration pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    title: String,
    description: String,
    target_files: BTreeSet<String>,
    priority: TaskPriority,
}

impl PipelineRequest {
    /// Creates a medium-priority pipeline request.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            target_files: BTreeSet::new(),
            priority: TaskPriority::Medium,
        }
    }

    /// Sets the files the feature will touch.
    #[must_use]
    pub fn with_files(mut self, files: impl IntoIterator<Item = String>) -> Self {
        self.target_files = files.into_iter().collect();
        self
    }

    /// Sets the pipeline priority. Research runs one level lower.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    fn stage(&self, stage: PipelineStage, depends_on: &[TaskId]) -> NewTask {
        let (task_type, title, description, priority) = match stage {
            PipelineStage::Design => (
                TaskType::DesignArchitecture,
                format!("Design: {}", self.title),
                self.description.clone(),
                self.priority,
            ),
            PipelineStage::Code => (
                TaskType::CodeImplement,
                format!("Implement: {}", self.title),
                self.description.clone(),
                self.priority,
            ),
            PipelineStage::Research => (
                TaskType::ResearchAlternatives,
                format!("Research: {}", self.title),
                format!("Find alternatives and edge cases for {}", self.title),
                self.priority.lowered(),
            ),
            PipelineStage::Review => (
                TaskType::ReviewCode,
                format!("Review: {}", self.title),
                format!("Code review for {}", self.title),
                self.priority,
            ),
            PipelineStage::Integrate => (
                TaskType::IntegrateMerge,
                format!("Integrate: {}", self.title),
                format!("Merge and deploy {}", self.title),
                self.priority,
            ),
        };
        NewTask::new(task_type, title)
            .with_description(description)
            .with_priority(priority)
            .with_target_files(self.target_files.iter().cloned())
            .with_depends_on(depends_on.iter().copied())
            .with_assigned_role(stage.role())
            .with_tags(["pipeline", stage.tag()])
    }
}

/// Service-level errors for task queue operations.
#[derive(Debug, Error)]
pub enum TaskQueueError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Snapshot persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for task queue operations.
pub type TaskQueueResult<T> = Result<T, TaskQueueError>;

/// Dependency-aware task queue.
///
/// Unknown tasks and refused transitions are reported as `false` or
/// `None`; validation and persistence failures are errors.
#[derive(Clone)]
pub struct TaskQueue<S, C>
where
    S: SnapshotStore<TaskGraph>,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> TaskQueue<S, C>
where
    S: SnapshotStore<TaskGraph>,
    C: Clock + Send + Sync,
{
    /// Creates a queue over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    fn query<R>(&self, read: impl FnOnce(&TaskGraph) -> R) -> TaskQueueResult<R> {
        let graph = self.store.read()?;
        Ok(read(&graph))
    }

    /// Adds a task. It starts blocked when a dependency is unfinished.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Domain`] for an empty title, a duplicate
    /// identifier, a self-dependency or a dependency cycle, or
    /// [`TaskQueueError::Store`] when persistence fails.
    pub fn add_task(&self, new_task: NewTask) -> TaskQueueResult<Task> {
        let task = Task::new(new_task, self.now())?;
        let added = self.store.update(|graph| graph.insert(task))??;
        info!(
            task_id = %added.task_id(),
            task_type = %added.task_type(),
            status = %added.status(),
            "added task"
        );
        Ok(added)
    }

    /// Claims a pending task for `agent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when persistence fails.
    pub fn assign_task(&self, task_id: TaskId, agent_id: &AgentId) -> TaskQueueResult<bool> {
        let assigned = self.store.update(|graph| graph.assign(task_id, agent_id))?;
        if assigned {
            debug!(task_id = %task_id, agent_id = %agent_id, "task assigned");
        }
        Ok(assigned)
    }

    /// Applies a status change; see [`TaskGraph::apply`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when persistence fails.
    pub fn update_task_status(
        &self,
        task_id: TaskId,
        update: StatusUpdate,
    ) -> TaskQueueResult<bool> {
        let now = self.now();
        let status = update.status();
        let applied = self.store.update(|graph| graph.apply(task_id, update, now))?;
        if applied {
            debug!(task_id = %task_id, status = %status, "task status updated");
        }
        Ok(applied)
    }

    /// Marks a task completed with its outcome, unblocking dependents.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when persistence fails.
    pub fn complete_task(
        &self,
        task_id: TaskId,
        result: impl Into<String>,
        created_files: impl IntoIterator<Item = String>,
        artifacts: TaskMetadata,
    ) -> TaskQueueResult<bool> {
        self.update_task_status(
            task_id,
            StatusUpdate::new(TaskStatus::Completed)
                .with_result(result)
                .with_created_files(created_files)
                .with_artifacts(artifacts),
        )
    }

    /// Marks a task failed. Dependents stay blocked.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when persistence fails.
    pub fn fail_task(&self, task_id: TaskId, error: impl Into<String>) -> TaskQueueResult<bool> {
        self.update_task_status(
            task_id,
            StatusUpdate::new(TaskStatus::Failed).with_error(error),
        )
    }

    /// Cancels a task, recording `reason` or a default message.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when persistence fails.
    pub fn cancel_task(&self, task_id: TaskId, reason: Option<&str>) -> TaskQueueResult<bool> {
        self.update_task_status(
            task_id,
            StatusUpdate::new(TaskStatus::Cancelled)
                .with_error(reason.unwrap_or(DEFAULT_CANCEL_REASON)),
        )
    }

    /// Returns pending tasks with every dependency complete, most urgent
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when the snapshot cannot be read.
    pub fn get_ready_tasks(&self) -> TaskQueueResult<Vec<Task>> {
        self.query(|graph| graph.ready().into_iter().cloned().collect())
    }

    /// Returns the agent's active tasks followed by ready tasks its role may
    /// take.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when the snapshot cannot be read.
    pub fn get_tasks_for_agent(
        &self,
        agent_id: &AgentId,
        role: AgentRole,
    ) -> TaskQueueResult<Vec<Task>> {
        self.query(|graph| graph.for_agent(agent_id, role).into_iter().cloned().collect())
    }

    /// Returns tasks past their deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when the snapshot cannot be read.
    pub fn get_overdue_tasks(&self) -> TaskQueueResult<Vec<Task>> {
        let now = self.now();
        self.query(|graph| graph.overdue(now).into_iter().cloned().collect())
    }

    /// Returns a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when the snapshot cannot be read.
    pub fn get_task(&self, task_id: TaskId) -> TaskQueueResult<Option<Task>> {
        self.query(|graph| graph.get(task_id).cloned())
    }

    /// Returns tasks waiting on dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when the snapshot cannot be read.
    pub fn get_blocked_tasks(&self) -> TaskQueueResult<Vec<Task>> {
        self.query(|graph| graph.blocked().into_iter().cloned().collect())
    }

    /// Returns the tasks `task_id` waits for.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when the snapshot cannot be read.
    pub fn get_dependencies(&self, task_id: TaskId) -> TaskQueueResult<Vec<Task>> {
        self.query(|graph| graph.dependencies(task_id).into_iter().cloned().collect())
    }

    /// Returns the tasks waiting for `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when the snapshot cannot be read.
    pub fn get_dependents(&self, task_id: TaskId) -> TaskQueueResult<Vec<Task>> {
        self.query(|graph| graph.dependents(task_id).into_iter().cloned().collect())
    }

    /// Returns every task in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when the snapshot cannot be read.
    pub fn list_tasks(&self) -> TaskQueueResult<Vec<Task>> {
        self.query(|graph| graph.iter().cloned().collect())
    }

    /// Returns queue statistics.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Store`] when the snapshot cannot be read.
    pub fn get_stats(&self) -> TaskQueueResult<TaskStats> {
        let now = self.now();
        self.query(|graph| graph.stats(now))
    }

    /// Creates the design, implement, research, review and integrate tasks
    /// for one feature, chained so each stage waits for the last. Review
    /// also waits for research.
    ///
    /// Returns the tasks in stage order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Domain`] for an empty title, or
    /// [`TaskQueueError::Store`] when persistence fails.
    pub fn create_pipeline(&self, request: &PipelineRequest) -> TaskQueueResult<Vec<Task>> {
        let design = self.add_task(request.stage(PipelineStage::Design, &[]))?;
        let implement =
            self.add_task(request.stage(PipelineStage::Code, &[design.task_id()]))?;
        let research =
            self.add_task(request.stage(PipelineStage::Research, &[implement.task_id()]))?;
        let review = self.add_task(request.stage(
            PipelineStage::Review,
            &[implement.task_id(), research.task_id()],
        ))?;
        let integrate =
            self.add_task(request.stage(PipelineStage::Integrate, &[review.task_id()]))?;
        info!(title = %request.title, design = %design.task_id(), "created task pipeline");
        Ok(vec![design, implement, research, review, integrate])
    }
}
