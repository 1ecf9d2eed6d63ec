//! Then steps for coordination BDD scenarios.

use super::world::{CoordinationWorld, agent};
use atelier::task::domain::TaskStatus;
use rstest_bdd_macros::then;
use std::collections::BTreeSet;

#[then("the last lock attempt succeeded")]
fn last_lock_succeeded(world: &CoordinationWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(world.last_lock == Some(true), "lock result {:?}", world.last_lock);
    Ok(())
}

#[then("the last lock attempt was refused")]
fn last_lock_refused(world: &CoordinationWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(world.last_lock == Some(false), "lock result {:?}", world.last_lock);
    Ok(())
}

#[then(r#"the lock on "{path}" is held by "{name}""#)]
fn lock_held_by(world: &CoordinationWorld, path: String, name: String) -> Result<(), eyre::Report> {
    let lock = world
        .coordination
        .coordinator()
        .get_lock_info(&path)?
        .ok_or_else(|| eyre::eyre!("no lock on {path}"))?;
    eyre::ensure!(lock.agent_id() == &agent(&name)?, "lock held by {}", lock.agent_id());
    Ok(())
}

#[then("{count:usize} expired lock was purged")]
fn expired_locks_purged(world: &CoordinationWorld, count: usize) -> Result<(), eyre::Report> {
    eyre::ensure!(world.purged == Some(count), "purged {:?}", world.purged);
    Ok(())
}

#[then("the queue holds {count:usize} tasks")]
fn queue_holds(world: &CoordinationWorld, count: usize) -> Result<(), eyre::Report> {
    let tasks = world.coordination.queue().list_tasks()?;
    eyre::ensure!(tasks.len() == count, "queue holds {} tasks", tasks.len());
    Ok(())
}

fn waits_on(
    world: &CoordinationWorld,
    stage: &str,
    expected: &[&str],
) -> Result<(), eyre::Report> {
    let task_id = world.stage(stage)?;
    let task = world
        .coordination
        .queue()
        .get_task(task_id)?
        .ok_or_else(|| eyre::eyre!("stage {stage} missing from the queue"))?;
    let wanted = expected
        .iter()
        .map(|name| world.stage(name))
        .collect::<Result<BTreeSet<_>, _>>()?;
    eyre::ensure!(
        task.depends_on() == &wanted,
        "stage {stage} waits on {:?}",
        task.depends_on()
    );
    Ok(())
}

#[then(r#"the "{stage}" stage waits on both "{first}" and "{second}""#)]
fn stage_waits_on_both(
    world: &CoordinationWorld,
    stage: String,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    waits_on(world, &stage, &[first.as_str(), second.as_str()])
}

#[then(r#"the "{stage}" stage waits only on "{first}""#)]
fn stage_waits_only_on(
    world: &CoordinationWorld,
    stage: String,
    first: String,
) -> Result<(), eyre::Report> {
    waits_on(world, &stage, &[first.as_str()])
}

#[then(r#"the "{stage}" stage is "{status}""#)]
fn stage_has_status(
    world: &CoordinationWorld,
    stage: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let task = world
        .coordination
        .queue()
        .get_task(world.stage(&stage)?)?
        .ok_or_else(|| eyre::eyre!("stage {stage} missing from the queue"))?;
    eyre::ensure!(
        task.status() == expected,
        "stage {stage} is {}, expected {expected}",
        task.status()
    );
    Ok(())
}

#[then("the event is not fully acknowledged")]
fn event_not_fully_acked(world: &CoordinationWorld) -> Result<(), eyre::Report> {
    let event = world
        .event
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no event was published"))?;
    eyre::ensure!(!event.is_fully_acked(), "event already fully acknowledged");
    Ok(())
}

#[then("the event is fully acknowledged")]
fn event_fully_acked(world: &CoordinationWorld) -> Result<(), eyre::Report> {
    let event = world
        .event
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no event was published"))?;
    eyre::ensure!(event.is_fully_acked(), "acknowledged by {:?}", event.acked_by());
    Ok(())
}

#[then("exactly one conflict is reported")]
fn exactly_one_conflict(world: &CoordinationWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(
        world.conflicts.len() == 1,
        "reported conflicts {:?}",
        world.conflicts
    );
    Ok(())
}

#[then(r#"it is a "{severity}" severity "{kind}" conflict involving "{first}" and "{second}""#)]
fn conflict_matches(
    world: &CoordinationWorld,
    severity: String,
    kind: String,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    let conflict = world
        .conflicts
        .first()
        .ok_or_else(|| eyre::eyre!("no conflict reported"))?;
    eyre::ensure!(conflict.severity().as_str() == severity);
    eyre::ensure!(conflict.conflict_type().as_str() == kind);
    let expected = BTreeSet::from([agent(&first)?, agent(&second)?]);
    eyre::ensure!(conflict.agents() == &expected, "agents {:?}", conflict.agents());
    Ok(())
}
