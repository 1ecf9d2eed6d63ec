//! Arena-backed task dependency graph.
//!
//! Tasks live in a vector in insertion order. Lookups go through an
//! id-to-slot map plus status and assignee indexes, all rebuilt from the
//! task list on load. Forward (`depends_on`) and reverse (`blocks`) links
//! are kept mutual by the graph; the reverse links are recomputed on load
//! rather than trusted.

use super::{Task, TaskDomainError, TaskId, TaskMetadata, TaskStatus};
use crate::agent::domain::{AgentId, AgentRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Requested status change plus the outcome fields recorded with it.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    status: TaskStatus,
    result: Option<String>,
    error: Option<String>,
    artifacts: Option<TaskMetadata>,
    created_files: BTreeSet<String>,
}

impl StatusUpdate {
    /// Creates an update with no outcome fields.
    #[must_use]
    pub const fn new(status: TaskStatus) -> Self {
        Self {
            status,
            result: None,
            error: None,
            artifacts: None,
            created_files: BTreeSet::new(),
        }
    }

    /// Records a result.
    #[must_use]
    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    /// Records an error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Merges artifacts into the task's artifact map.
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: TaskMetadata) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Records files the task created.
    #[must_use]
    pub fn with_created_files(mut self, files: impl IntoIterator<Item = String>) -> Self {
        self.created_files = files.into_iter().collect();
        self
    }

    /// Returns the requested status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }
}

/// Queue statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// Number of tasks.
    pub total: usize,
    /// Count per status, every status present.
    pub by_status: BTreeMap<TaskStatus, usize>,
    /// Tasks past their deadline and not completed or cancelled.
    pub overdue: usize,
    /// Tasks waiting on dependencies.
    pub blocked: usize,
}

/// Persisted form of the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TaskBoard {
    #[serde(default, deserialize_with = "crate::store::lenient::vec")]
    tasks: Vec<Task>,
}

/// Task DAG with status and assignee indexes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaskBoard", into = "TaskBoard")]
pub struct TaskGraph {
    tasks: Vec<Task>,
    slots: BTreeMap<TaskId, usize>,
    by_status: BTreeMap<TaskStatus, BTreeSet<usize>>,
    by_assignee: BTreeMap<AgentId, BTreeSet<usize>>,
}

impl From<TaskBoard> for TaskGraph {
    fn from(board: TaskBoard) -> Self {
        let mut graph = Self::default();
        for mut task in board.tasks {
            if graph.slots.contains_key(&task.task_id()) {
                tracing::warn!(task_id = %task.task_id(), "skipping duplicate task record");
                continue;
            }
            task.clear_dependents();
            graph.push(task);
        }
        graph.relink();
        graph
    }
}

impl From<TaskGraph> for TaskBoard {
    fn from(graph: TaskGraph) -> Self {
        Self { tasks: graph.tasks }
    }
}

impl TaskGraph {
    /// Returns the number of tasks.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns whether the graph holds no tasks.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns every task in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Returns the task with `task_id`.
    #[must_use]
    pub fn get(&self, task_id: TaskId) -> Option<&Task> {
        self.slots
            .get(&task_id)
            .and_then(|slot| self.tasks.get(*slot))
    }

    fn slot_mut(&mut self, slot: usize) -> Option<&mut Task> {
        self.tasks.get_mut(slot)
    }

    fn push(&mut self, task: Task) {
        let slot = self.tasks.len();
        self.slots.insert(task.task_id(), slot);
        self.index(slot, &task);
        self.tasks.push(task);
    }

    fn index(&mut self, slot: usize, task: &Task) {
        self.by_status
            .entry(task.status())
            .or_default()
            .insert(slot);
        if let Some(agent) = task.assigned_to() {
            self.by_assignee
                .entry(agent.clone())
                .or_default()
                .insert(slot);
        }
    }

    fn unindex(&mut self, slot: usize, task: &Task) {
        if let Some(slots) = self.by_status.get_mut(&task.status()) {
            slots.remove(&slot);
        }
        if let Some(agent) = task.assigned_to() {
            if let Some(slots) = self.by_assignee.get_mut(agent) {
                slots.remove(&slot);
                if slots.is_empty() {
                    self.by_assignee.remove(agent);
                }
            }
        }
    }

    /// Applies `mutate` to the task in `slot`, keeping the indexes current.
    fn reindexed<R>(&mut self, slot: usize, mutate: impl FnOnce(&mut Task) -> R) -> Option<R> {
        let snapshot = self.tasks.get(slot)?.clone();
        self.unindex(slot, &snapshot);
        let task = self.slot_mut(slot)?;
        let outcome = mutate(task);
        let updated = task.clone();
        self.index(slot, &updated);
        Some(outcome)
    }

    /// Rebuilds every reverse link from the forward links.
    fn relink(&mut self) {
        let edges: Vec<(TaskId, TaskId)> = self
            .tasks
            .iter()
            .flat_map(|task| {
                task.depends_on()
                    .iter()
                    .map(move |dependency| (*dependency, task.task_id()))
            })
            .collect();
        for (dependency, dependent) in edges {
            if let Some(slot) = self.slots.get(&dependency).copied() {
                if let Some(task) = self.slot_mut(slot) {
                    task.link_dependent(dependent);
                }
            }
        }
    }

    /// Returns whether every dependency of `task` has completed. Unknown
    /// dependencies are never satisfied.
    #[must_use]
    pub fn dependencies_met(&self, task: &Task) -> bool {
        task.depends_on().iter().all(|dependency| {
            self.get(*dependency)
                .is_some_and(|found| found.status() == TaskStatus::Completed)
        })
    }

    fn reaches(&self, from: &BTreeSet<TaskId>, target: TaskId) -> bool {
        let mut stack: Vec<TaskId> = from.iter().copied().collect();
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(task) = self.get(current) {
                stack.extend(task.depends_on().iter().copied());
            }
        }
        false
    }

    /// Inserts a new task, linking it to its dependencies and to any
    /// existing task that already names it as a dependency.
    ///
    /// The task starts blocked when a dependency is unfinished or unknown.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DuplicateTask`] when the identifier is
    /// taken, [`TaskDomainError::SelfDependency`] when the task depends on
    /// itself, or [`TaskDomainError::DependencyCycle`] when the new edges
    /// would close a cycle.
    pub fn insert(&mut self, mut task: Task) -> Result<Task, TaskDomainError> {
        let task_id = task.task_id();
        if self.slots.contains_key(&task_id) {
            return Err(TaskDomainError::DuplicateTask(task_id));
        }
        if task.depends_on().contains(&task_id) {
            return Err(TaskDomainError::SelfDependency(task_id));
        }
        if self.reaches(task.depends_on(), task_id) {
            return Err(TaskDomainError::DependencyCycle(task_id));
        }

        task.clear_dependents();
        for existing in &self.tasks {
            if existing.depends_on().contains(&task_id) {
                task.link_dependent(existing.task_id());
            }
        }
        if !self.dependencies_met(&task) {
            task.set_status(TaskStatus::Blocked);
        }
        let dependencies: Vec<TaskId> = task.depends_on().iter().copied().collect();
        let stored = task.clone();
        self.push(task);
        for dependency in dependencies {
            if let Some(dependency_slot) = self.slots.get(&dependency).copied() {
                if let Some(found) = self.slot_mut(dependency_slot) {
                    found.link_dependent(task_id);
                }
            }
        }
        Ok(stored)
    }

    /// Claims a pending task for `agent`.
    ///
    /// Claiming a task the agent already holds succeeds without change.
    /// Returns `false` for unknown, blocked and finished tasks, and for
    /// tasks claimed by another agent.
    pub fn assign(&mut self, task_id: TaskId, agent: &AgentId) -> bool {
        let Some(slot) = self.slots.get(&task_id).copied() else {
            return false;
        };
        let Some((status, claimant)) = self
            .tasks
            .get(slot)
            .map(|task| (task.status(), task.assigned_to().cloned()))
        else {
            return false;
        };
        match (status, claimant) {
            (TaskStatus::Assigned | TaskStatus::InProgress, Some(holder)) => holder == *agent,
            (TaskStatus::Pending, None) => self
                .reindexed(slot, |found| {
                    found.set_assignee(Some(agent.clone()));
                    found.set_status(TaskStatus::Assigned);
                })
                .is_some(),
            _ => false,
        }
    }

    /// Applies a status change if the status machine allows it.
    ///
    /// Requesting `pending` while a dependency is unfinished moves the task
    /// to `blocked` instead. Leaving `assigned` for `pending` releases the
    /// assignee. The first entry to `in_progress` stamps the start time and
    /// entry to a terminal status stamps the end time. Completing a task
    /// promotes every blocked dependent whose dependencies are now all
    /// complete.
    ///
    /// Returns `false` for unknown tasks and refused transitions.
    pub fn apply(&mut self, task_id: TaskId, update: StatusUpdate, now: DateTime<Utc>) -> bool {
        let Some(slot) = self.slots.get(&task_id).copied() else {
            return false;
        };
        let Some(task) = self.tasks.get(slot) else {
            return false;
        };
        let current = task.status();
        let target = if update.status == TaskStatus::Pending && !self.dependencies_met(task) {
            TaskStatus::Blocked
        } else {
            update.status
        };
        if !current.can_transition_to(target) {
            return false;
        }

        let StatusUpdate {
            result,
            error,
            artifacts,
            created_files,
            ..
        } = update;
        let applied = self.reindexed(slot, |found| {
            found.set_status(target);
            if current == TaskStatus::Assigned && target == TaskStatus::Pending {
                found.set_assignee(None);
            }
            if target == TaskStatus::InProgress {
                found.mark_started(now);
            }
            if target.is_terminal() {
                found.mark_finished(now);
            }
            if let Some(value) = result {
                found.set_result(value);
            }
            if let Some(value) = error {
                found.set_error(value);
            }
            if let Some(values) = artifacts {
                found.merge_artifacts(values);
            }
            found.add_created_files(created_files);
        });
        if applied.is_none() {
            return false;
        }
        if target == TaskStatus::Completed {
            self.promote_dependents(task_id);
        }
        true
    }

    fn promote_dependents(&mut self, task_id: TaskId) {
        let dependents: Vec<TaskId> = self
            .get(task_id)
            .map(|task| task.blocks().iter().copied().collect())
            .unwrap_or_default();
        for dependent in dependents {
            let Some(slot) = self.slots.get(&dependent).copied() else {
                continue;
            };
            let ready = self.tasks.get(slot).is_some_and(|task| {
                task.status() == TaskStatus::Blocked && self.dependencies_met(task)
            });
            if ready
                && self
                    .reindexed(slot, |task| task.set_status(TaskStatus::Pending))
                    .is_some()
            {
                tracing::debug!(task_id = %dependent, "dependencies met; task unblocked");
            }
        }
    }

    fn with_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.by_status
            .get(&status)
            .into_iter()
            .flatten()
            .filter_map(|slot| self.tasks.get(*slot))
    }

    /// Returns pending tasks whose dependencies are all complete, most
    /// urgent first, ties in insertion order.
    #[must_use]
    pub fn ready(&self) -> Vec<&Task> {
        let mut ready: Vec<&Task> = self
            .with_status(TaskStatus::Pending)
            .filter(|task| self.dependencies_met(task))
            .collect();
        ready.sort_by_key(|task| task.priority());
        ready
    }

    /// Returns blocked tasks in insertion order.
    #[must_use]
    pub fn blocked(&self) -> Vec<&Task> {
        self.with_status(TaskStatus::Blocked).collect()
    }

    /// Returns the agent's assigned and in-progress tasks, followed by ready
    /// tasks open to `role`.
    #[must_use]
    pub fn for_agent(&self, agent: &AgentId, role: AgentRole) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .by_assignee
            .get(agent)
            .into_iter()
            .flatten()
            .filter_map(|slot| self.tasks.get(*slot))
            .filter(|task| {
                matches!(task.status(), TaskStatus::Assigned | TaskStatus::InProgress)
            })
            .collect();
        tasks.extend(
            self.ready()
                .into_iter()
                .filter(|task| task.assigned_role().is_none_or(|wanted| wanted == role)),
        );
        tasks
    }

    /// Returns tasks past their deadline that are not completed or
    /// cancelled.
    #[must_use]
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.is_overdue(now))
            .filter(|task| {
                !matches!(task.status(), TaskStatus::Completed | TaskStatus::Cancelled)
            })
            .collect()
    }

    /// Returns the known tasks `task_id` depends on.
    #[must_use]
    pub fn dependencies(&self, task_id: TaskId) -> Vec<&Task> {
        self.get(task_id)
            .map(|task| {
                task.depends_on()
                    .iter()
                    .filter_map(|dependency| self.get(*dependency))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the tasks that depend on `task_id`.
    #[must_use]
    pub fn dependents(&self, task_id: TaskId) -> Vec<&Task> {
        self.get(task_id)
            .map(|task| {
                task.blocks()
                    .iter()
                    .filter_map(|dependent| self.get(*dependent))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns counts per status plus overdue and blocked totals.
    #[must_use]
    pub fn stats(&self, now: DateTime<Utc>) -> TaskStats {
        let by_status = TaskStatus::ALL
            .into_iter()
            .map(|status| {
                let count = self.by_status.get(&status).map_or(0, BTreeSet::len);
                (status, count)
            })
            .collect();
        TaskStats {
            total: self.tasks.len(),
            by_status,
            overdue: self.overdue(now).len(),
            blocked: self.by_status.get(&TaskStatus::Blocked).map_or(0, BTreeSet::len),
        }
    }
}
