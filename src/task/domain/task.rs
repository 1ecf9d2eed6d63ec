//! Task record.

use super::{TaskDomainError, TaskId, TaskPriority, TaskStatus, TaskType};
use crate::agent::domain::{AgentId, AgentRole};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Free-form metadata and artifact maps.
pub type TaskMetadata = serde_json::Map<String, serde_json::Value>;

/// Parameter object for creating a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    task_id: Option<TaskId>,
    task_type: TaskType,
    title: String,
    description: String,
    priority: TaskPriority,
    target_files: BTreeSet<String>,
    depends_on: BTreeSet<TaskId>,
    assigned_role: Option<AgentRole>,
    deadline: Option<DateTime<Utc>>,
    metadata: TaskMetadata,
    tags: BTreeSet<String>,
}

impl NewTask {
    /// Creates a medium-priority task with no dependencies.
    #[must_use]
    pub fn new(task_type: TaskType, title: impl Into<String>) -> Self {
        Self {
            task_id: None,
            task_type,
            title: title.into(),
            description: String::new(),
            priority: TaskPriority::Medium,
            target_files: BTreeSet::new(),
            depends_on: BTreeSet::new(),
            assigned_role: None,
            deadline: None,
            metadata: TaskMetadata::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Uses a caller-chosen identifier instead of a random one.
    #[must_use]
    pub const fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the files the task will touch.
    #[must_use]
    pub fn with_target_files(mut self, files: impl IntoIterator<Item = String>) -> Self {
        self.target_files = files.into_iter().collect();
        self
    }

    /// Sets the tasks that must complete first.
    #[must_use]
    pub fn with_depends_on(mut self, depends_on: impl IntoIterator<Item = TaskId>) -> Self {
        self.depends_on = depends_on.into_iter().collect();
        self
    }

    /// Restricts the task to agents of one role.
    #[must_use]
    pub const fn with_assigned_role(mut self, role: AgentRole) -> Self {
        self.assigned_role = Some(role);
        self
    }

    /// Sets a deadline. Missing it only marks the task overdue.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets free-form metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: TaskMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets tags.
    #[must_use]
    pub fn with_tags<T: Into<String>>(mut self, tags: impl IntoIterator<Item = T>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// A unit of work in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    task_id: TaskId,
    task_type: TaskType,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    priority: TaskPriority,
    #[serde(default)]
    assigned_to: Option<AgentId>,
    #[serde(default)]
    assigned_role: Option<AgentRole>,
    #[serde(default)]
    target_files: BTreeSet<String>,
    #[serde(default)]
    created_files: BTreeSet<String>,
    #[serde(default)]
    depends_on: BTreeSet<TaskId>,
    #[serde(default)]
    blocks: BTreeSet<TaskId>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    artifacts: TaskMetadata,
    #[serde(default)]
    metadata: TaskMetadata,
    #[serde(default)]
    tags: BTreeSet<String>,
}

impl Task {
    /// Creates a pending task from a parameter object.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank, or
    /// [`TaskDomainError::SelfDependency`] when an explicit identifier is
    /// also listed as a dependency.
    pub fn new(new_task: NewTask, created_at: DateTime<Utc>) -> Result<Self, TaskDomainError> {
        let NewTask {
            task_id,
            task_type,
            title,
            description,
            priority,
            target_files,
            depends_on,
            assigned_role,
            deadline,
            metadata,
            tags,
        } = new_task;
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let id = task_id.unwrap_or_default();
        if depends_on.contains(&id) {
            return Err(TaskDomainError::SelfDependency(id));
        }
        Ok(Self {
            task_id: id,
            task_type,
            title: trimmed.to_owned(),
            description,
            status: TaskStatus::Pending,
            priority,
            assigned_to: None,
            assigned_role,
            target_files,
            created_files: BTreeSet::new(),
            depends_on,
            blocks: BTreeSet::new(),
            created_at,
            started_at: None,
            completed_at: None,
            deadline,
            result: None,
            error: None,
            artifacts: TaskMetadata::new(),
            metadata,
            tags,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the task type.
    #[must_use]
    pub const fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the assigned agent, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<&AgentId> {
        self.assigned_to.as_ref()
    }

    /// Returns the role the task is reserved for, if any.
    #[must_use]
    pub const fn assigned_role(&self) -> Option<AgentRole> {
        self.assigned_role
    }

    /// Returns the files the task targets.
    #[must_use]
    pub const fn target_files(&self) -> &BTreeSet<String> {
        &self.target_files
    }

    /// Returns the files the task reported creating.
    #[must_use]
    pub const fn created_files(&self) -> &BTreeSet<String> {
        &self.created_files
    }

    /// Returns the tasks this task waits for.
    #[must_use]
    pub const fn depends_on(&self) -> &BTreeSet<TaskId> {
        &self.depends_on
    }

    /// Returns the tasks waiting for this task.
    #[must_use]
    pub const fn blocks(&self) -> &BTreeSet<TaskId> {
        &self.blocks
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when work first started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the task reached a terminal status.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns the recorded result.
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Returns the recorded error.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the recorded artifacts.
    #[must_use]
    pub const fn artifacts(&self) -> &TaskMetadata {
        &self.artifacts
    }

    /// Returns the free-form metadata.
    #[must_use]
    pub const fn metadata(&self) -> &TaskMetadata {
        &self.metadata
    }

    /// Returns the tags.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns whether the deadline has passed at `now`.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now > deadline)
    }

    /// Returns time spent since work started: up to completion when
    /// finished, up to `now` otherwise. `None` before work starts.
    #[must_use]
    pub fn duration(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        let started = self.started_at?;
        let end = self.completed_at.unwrap_or(now);
        Some(end.signed_duration_since(started))
    }

    pub(super) const fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    pub(super) fn mark_started(&mut self, now: DateTime<Utc>) {
        self.started_at.get_or_insert(now);
    }

    pub(super) const fn mark_finished(&mut self, now: DateTime<Utc>) {
        self.completed_at = Some(now);
    }

    pub(super) fn set_assignee(&mut self, agent: Option<AgentId>) {
        self.assigned_to = agent;
    }

    pub(super) fn set_result(&mut self, result: String) {
        self.result = Some(result);
    }

    pub(super) fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }

    pub(super) fn merge_artifacts(&mut self, artifacts: TaskMetadata) {
        self.artifacts.extend(artifacts);
    }

    pub(super) fn add_created_files(&mut self, files: BTreeSet<String>) {
        self.created_files.extend(files);
    }

    pub(super) fn link_dependent(&mut self, dependent: TaskId) {
        self.blocks.insert(dependent);
    }

    pub(super) fn clear_dependents(&mut self) {
        self.blocks.clear();
    }
}
