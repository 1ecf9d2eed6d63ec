//! When steps for coordination BDD scenarios.

use super::world::{CoordinationWorld, agent};
use atelier::event::domain::{EventType, PublishRequest};
use atelier::task::domain::TaskMetadata;
use atelier::task::services::PipelineRequest;
use eyre::WrapErr;
use rstest_bdd_macros::when;
use std::time::Duration;

const STAGE_NAMES: [&str; 5] = ["design", "implement", "research", "review", "integrate"];

#[when(r#""{name}" locks "{path}""#)]
fn agent_locks(
    world: &mut CoordinationWorld,
    name: String,
    path: String,
) -> Result<(), eyre::Report> {
    let request = world.coordination.lock_request(agent(&name)?, path);
    let granted = world
        .coordination
        .coordinator()
        .acquire_lock(request)
        .wrap_err("acquire lock")?;
    world.last_lock = Some(granted);
    Ok(())
}

#[when("{seconds:u64} seconds pass")]
fn seconds_pass(world: &mut CoordinationWorld, seconds: u64) {
    world.clock.advance(Duration::from_secs(seconds));
}

#[when("housekeeping runs")]
fn housekeeping_runs(world: &mut CoordinationWorld) -> Result<(), eyre::Report> {
    world.purged = Some(world.coordination.coordinator().purge_expired_locks()?);
    Ok(())
}

/// Creates the five-stage pipeline and records each stage's task.
pub fn create_pipeline(
    world: &mut CoordinationWorld,
    title: String,
    file: String,
) -> Result<(), eyre::Report> {
    let request = PipelineRequest::new(title, "Scenario feature").with_files([file]);
    let tasks = world
        .coordination
        .queue()
        .create_pipeline(&request)
        .wrap_err("create pipeline")?;
    eyre::ensure!(tasks.len() == STAGE_NAMES.len(), "pipeline has {} tasks", tasks.len());
    world.stages = STAGE_NAMES
        .iter()
        .zip(&tasks)
        .map(|(stage, task)| ((*stage).to_owned(), task.task_id()))
        .collect();
    Ok(())
}

#[when(r#"a pipeline is created for "{title}" touching "{file}""#)]
fn pipeline_created(
    world: &mut CoordinationWorld,
    title: String,
    file: String,
) -> Result<(), eyre::Report> {
    create_pipeline(world, title, file)
}

#[when(r#"the "{stage}" stage is completed"#)]
fn stage_completed(world: &mut CoordinationWorld, stage: String) -> Result<(), eyre::Report> {
    let task_id = world.stage(&stage)?;
    let completed = world.coordination.queue().complete_task(
        task_id,
        format!("{stage} done"),
        Vec::new(),
        TaskMetadata::new(),
    )?;
    eyre::ensure!(completed, "stage {stage} could not be completed");
    Ok(())
}

#[when(r#""{source}" publishes a "{event_type}" event for "{first}" and "{second}" requiring acknowledgement"#)]
fn targeted_event_published(
    world: &mut CoordinationWorld,
    source: String,
    event_type: String,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    let parsed = EventType::try_from(event_type.as_str())
        .map_err(|err| eyre::eyre!("invalid event type in scenario: {err}"))?;
    let request = PublishRequest::new(parsed, agent(&source)?)
        .with_targets([agent(&first)?, agent(&second)?])
        .requiring_ack();
    world.event = Some(world.coordination.bus().publish(request));
    Ok(())
}

#[when(r#""{name}" acknowledges the event"#)]
fn agent_acknowledges(world: &mut CoordinationWorld, name: String) -> Result<(), eyre::Report> {
    let event_id = world
        .event
        .as_ref()
        .map(|event| event.event_id())
        .ok_or_else(|| eyre::eyre!("no event was published"))?;
    let bus = world.coordination.bus();
    eyre::ensure!(bus.ack_event(event_id, &agent(&name)?), "ack refused for {name}");
    world.event = bus.get_event(event_id);
    Ok(())
}

#[when("conflicts are detected")]
fn conflicts_detected(world: &mut CoordinationWorld) -> Result<(), eyre::Report> {
    world.conflicts = world
        .coordination
        .detector()
        .detect_conflicts()
        .wrap_err("detect conflicts")?;
    Ok(())
}
