//! Given steps for coordination BDD scenarios.

use super::when::create_pipeline;
use super::world::{CoordinationWorld, agent};
use atelier::agent::domain::{AgentRole, AgentStatus};
use atelier::agent::services::{AcquireLockRequest, RegisterAgentRequest};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use std::time::Duration;

#[given(r#"agent "{name}" is registered as "{role}""#)]
fn agent_registered(
    world: &mut CoordinationWorld,
    name: String,
    role: String,
) -> Result<(), eyre::Report> {
    let parsed = AgentRole::try_from(role.as_str())
        .map_err(|err| eyre::eyre!("invalid role in scenario: {err}"))?;
    world
        .coordination
        .coordinator()
        .register(RegisterAgentRequest::new(name, parsed))
        .wrap_err("register agent")?;
    Ok(())
}

#[given(r#""{name}" is working on "{path}""#)]
fn agent_working_on(
    world: &mut CoordinationWorld,
    name: String,
    path: String,
) -> Result<(), eyre::Report> {
    let updated = world.coordination.coordinator().update_agent_status(
        &agent(&name)?,
        AgentStatus::Working,
        Some(path),
    )?;
    eyre::ensure!(updated, "agent {name} is not registered");
    Ok(())
}

#[given(r#""{name}" holds a lock on "{path}" for {seconds:u64} seconds"#)]
fn agent_holds_short_lock(
    world: &mut CoordinationWorld,
    name: String,
    path: String,
    seconds: u64,
) -> Result<(), eyre::Report> {
    let granted = world.coordination.coordinator().acquire_lock(
        AcquireLockRequest::new(agent(&name)?, path.as_str())
            .with_ttl(Duration::from_secs(seconds)),
    )?;
    eyre::ensure!(granted, "lock on {path} refused for {name}");
    Ok(())
}

#[given(r#"a pipeline for "{title}" touching "{file}""#)]
fn existing_pipeline(
    world: &mut CoordinationWorld,
    title: String,
    file: String,
) -> Result<(), eyre::Report> {
    create_pipeline(world, title, file)
}
