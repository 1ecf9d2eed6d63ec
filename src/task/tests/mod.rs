//! Unit tests for the task queue.

mod domain_tests;

use crate::task::domain::{NewTask, Task, TaskType};
use chrono::{DateTime, TimeZone, Utc};

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("valid test instant"))
}

fn task(new_task: NewTask) -> Task {
    Task::new(new_task, epoch()).unwrap_or_else(|err| panic!("invalid test task: {err}"))
}

fn code(title: &str) -> NewTask {
    NewTask::new(TaskType::CodeImplement, title)
}
