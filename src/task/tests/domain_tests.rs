//! Tests for task scalar types and task construction.

use super::{code, epoch, task};
use crate::agent::domain::AgentRole;
use crate::task::domain::{
    NewTask, PipelineStage, Task, TaskDomainError, TaskId, TaskPriority, TaskStatus, TaskType,
};
use chrono::TimeDelta;
use rstest::rstest;

#[rstest]
#[case(TaskPriority::Critical, TaskPriority::High)]
#[case(TaskPriority::Medium, TaskPriority::Low)]
#[case(TaskPriority::Low, TaskPriority::Background)]
#[case(TaskPriority::Background, TaskPriority::Background)]
fn lowered_priority_caps_at_background(#[case] from: TaskPriority, #[case] expected: TaskPriority) {
    assert_eq!(from.lowered(), expected);
}

#[rstest]
fn priority_orders_most_urgent_first() {
    assert!(TaskPriority::Critical < TaskPriority::High);
    assert!(TaskPriority::Low < TaskPriority::Background);
    assert_eq!(TaskPriority::default(), TaskPriority::Medium);
}

#[rstest]
fn priority_persists_as_integer() -> eyre::Result<()> {
    eyre::ensure!(serde_json::to_value(TaskPriority::High)? == serde_json::json!(1));
    let parsed: TaskPriority = serde_json::from_value(serde_json::json!(4))?;
    eyre::ensure!(parsed == TaskPriority::Background);
    eyre::ensure!(serde_json::from_value::<TaskPriority>(serde_json::json!(9)).is_err());
    Ok(())
}

#[rstest]
#[case(TaskStatus::Pending, TaskStatus::Assigned, true)]
#[case(TaskStatus::Pending, TaskStatus::Blocked, true)]
#[case(TaskStatus::Blocked, TaskStatus::Pending, true)]
#[case(TaskStatus::Blocked, TaskStatus::InProgress, false)]
#[case(TaskStatus::Assigned, TaskStatus::Pending, true)]
#[case(TaskStatus::InProgress, TaskStatus::Pending, false)]
#[case(TaskStatus::InProgress, TaskStatus::Completed, true)]
#[case(TaskStatus::Completed, TaskStatus::Pending, false)]
#[case(TaskStatus::Failed, TaskStatus::InProgress, false)]
#[case(TaskStatus::Cancelled, TaskStatus::Completed, false)]
fn status_machine_gates_transitions(
    #[case] from: TaskStatus,
    #[case] to: TaskStatus,
    #[case] allowed: bool,
) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[rstest]
fn no_status_transitions_to_itself() {
    for status in TaskStatus::ALL {
        assert!(!status.can_transition_to(status), "{status} self-transition");
    }
}

#[rstest]
#[case("in_progress", TaskStatus::InProgress)]
#[case(" Blocked ", TaskStatus::Blocked)]
fn status_parses_storage_names(#[case] raw: &str, #[case] expected: TaskStatus) {
    assert_eq!(TaskStatus::try_from(raw), Ok(expected));
}

#[rstest]
#[case(TaskType::DesignInterface, PipelineStage::Design, AgentRole::Architect)]
#[case(TaskType::CodeMigration, PipelineStage::Code, AgentRole::Coder)]
#[case(TaskType::ResearchLoadTest, PipelineStage::Research, AgentRole::Researcher)]
#[case(TaskType::ReviewSecurity, PipelineStage::Review, AgentRole::Reviewer)]
#[case(TaskType::IntegrateDocument, PipelineStage::Integrate, AgentRole::Coordinator)]
fn task_types_map_to_stage_roles(
    #[case] task_type: TaskType,
    #[case] stage: PipelineStage,
    #[case] role: AgentRole,
) {
    assert_eq!(task_type.stage(), stage);
    assert_eq!(stage.role(), role);
}

#[rstest]
fn task_type_names_round_trip() -> eyre::Result<()> {
    for task_type in TaskType::ALL {
        eyre::ensure!(TaskType::try_from(task_type.as_str()) == Ok(task_type));
        eyre::ensure!(serde_json::to_value(task_type)? == serde_json::json!(task_type.as_str()));
    }
    eyre::ensure!(TaskType::try_from("code.golf").is_err());
    Ok(())
}

#[rstest]
fn new_task_starts_pending_with_trimmed_title() {
    let created = task(code("  Add parser  ").with_priority(TaskPriority::High));
    assert_eq!(created.title(), "Add parser");
    assert_eq!(created.status(), TaskStatus::Pending);
    assert_eq!(created.priority(), TaskPriority::High);
    assert!(created.assigned_to().is_none());
    assert!(created.started_at().is_none());
}

#[rstest]
fn new_task_rejects_blank_title() {
    assert_eq!(Task::new(code(" "), epoch()), Err(TaskDomainError::EmptyTitle));
}

#[rstest]
fn new_task_rejects_self_dependency() {
    let id = TaskId::new();
    let result = Task::new(code("loop").with_task_id(id).with_depends_on([id]), epoch());
    assert_eq!(result, Err(TaskDomainError::SelfDependency(id)));
}

#[rstest]
fn overdue_only_after_deadline() {
    let deadline = epoch() + TimeDelta::hours(1);
    let created = task(NewTask::new(TaskType::CodeTest, "tests").with_deadline(deadline));
    assert!(!created.is_overdue(deadline));
    assert!(created.is_overdue(deadline + TimeDelta::seconds(1)));
    assert!(!task(code("no deadline")).is_overdue(deadline + TimeDelta::days(1)));
}

#[rstest]
fn duration_is_absent_before_start() {
    assert!(task(code("idle")).duration(epoch()).is_none());
}
