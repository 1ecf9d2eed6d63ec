//! Detection passes over a snapshot of registered agents.
//!
//! Each pass is independent and only reports observations; recording them
//! is the detector's job.

use crate::agent::domain::{Agent, AgentId, AgentRole, AgentStatus, FileZone, top_level_directory};
use crate::conflict::domain::{ConflictType, NewConflict};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Pipeline roles in hand-off order with the stage each one owns.
const PIPELINE_ORDER: [(AgentRole, &str); 4] = [
    (AgentRole::Architect, "design"),
    (AgentRole::Coder, "implementation"),
    (AgentRole::Researcher, "research"),
    (AgentRole::Reviewer, "review"),
];

/// Runs every pass in a fixed order.
pub(super) fn detect_all(agents: &[Agent]) -> Vec<NewConflict> {
    let mut observations = lock_conflicts(agents);
    observations.extend(zone_violations(agents));
    observations.extend(priority_collisions(agents));
    observations.extend(pipeline_overlaps(agents));
    observations
}

fn join(agents: &BTreeSet<AgentId>) -> String {
    agents
        .iter()
        .map(AgentId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Paths listed in more than one agent's held set.
pub(super) fn lock_conflicts(agents: &[Agent]) -> Vec<NewConflict> {
    let mut holders: BTreeMap<&str, BTreeSet<AgentId>> = BTreeMap::new();
    for agent in agents {
        for path in agent.locked_files() {
            holders
                .entry(path.as_str())
                .or_default()
                .insert(agent.agent_id().clone());
        }
    }
    holders
        .into_iter()
        .filter(|(_, claimants)| claimants.len() > 1)
        .map(|(path, claimants)| {
            let description = format!("Multiple agents have locks on {path}: {}", join(&claimants));
            NewConflict::new(ConflictType::FileLock, claimants, description).with_path(path)
        })
        .collect()
}

/// Held paths the holder's zone does not grant.
pub(super) fn zone_violations(agents: &[Agent]) -> Vec<NewConflict> {
    agents
        .iter()
        .flat_map(|agent| {
            let zone = FileZone::for_role(agent.role());
            agent
                .locked_files()
                .iter()
                .filter(move |path| !zone.can_access(path))
                .map(move |path| {
                    NewConflict::new(
                        ConflictType::ZoneViolation,
                        [agent.agent_id().clone()],
                        format!(
                            "Agent {} ({}) holds forbidden path: {path}",
                            agent.agent_id(),
                            agent.role()
                        ),
                    )
                    .with_path(path.as_str())
                    .with_detail("role", json!(agent.role().as_str()))
                    .with_detail("forbidden_paths", json!(zone.forbidden()))
                })
        })
        .collect()
}

/// Non-human agents of equal priority whose current tasks share a
/// top-level directory.
pub(super) fn priority_collisions(agents: &[Agent]) -> Vec<NewConflict> {
    let mut directories: BTreeMap<&str, Vec<&Agent>> = BTreeMap::new();
    for agent in agents {
        if let Some(task) = agent.current_task() {
            directories
                .entry(top_level_directory(task))
                .or_default()
                .push(agent);
        }
    }
    directories
        .into_iter()
        .filter(|(_, sharing)| sharing.len() > 1)
        .filter(|(_, sharing)| {
            let zones: Vec<&FileZone> = sharing
                .iter()
                .map(|agent| FileZone::for_role(agent.role()))
                .collect();
            let first = zones.first().map(|zone| zone.priority());
            zones
                .iter()
                .all(|zone| !zone.is_human() && Some(zone.priority()) == first)
        })
        .map(|(directory, sharing)| {
            let roles: Vec<&str> = sharing.iter().map(|agent| agent.role().as_str()).collect();
            NewConflict::new(
                ConflictType::Priority,
                sharing.iter().map(|agent| agent.agent_id().clone()),
                format!("Agents with same priority working in {directory}"),
            )
            .with_path(directory)
            .with_detail("roles", json!(roles))
        })
        .collect()
}

/// Adjacent pipeline stages working at the same time on shared files.
pub(super) fn pipeline_overlaps(agents: &[Agent]) -> Vec<NewConflict> {
    let working = |role: AgentRole| -> Vec<&Agent> {
        agents
            .iter()
            .filter(|agent| agent.status() == AgentStatus::Working && agent.role() == role)
            .collect()
    };
    let held = |members: &[&Agent]| -> BTreeSet<String> {
        members
            .iter()
            .flat_map(|agent| agent.locked_files().iter().cloned())
            .collect()
    };

    PIPELINE_ORDER
        .windows(2)
        .filter_map(|pair| {
            let [(role, stage), (next_role, next_stage)] = pair else {
                return None;
            };
            let current = working(*role);
            let next = working(*next_role);
            if current.is_empty() || next.is_empty() {
                return None;
            }
            let overlap: BTreeSet<String> =
                held(current.as_slice()).intersection(&held(next.as_slice())).cloned().collect();
            let first = overlap.first()?.clone();
            let involved = current
                .iter()
                .chain(next.iter())
                .map(|agent| agent.agent_id().clone());
            Some(
                NewConflict::new(
                    ConflictType::Pipeline,
                    involved,
                    format!("Pipeline conflict: {stage} and {next_stage} stages working on same files"),
                )
                .with_path(first)
                .with_detail("current_stage", json!(stage))
                .with_detail("next_stage", json!(next_stage))
                .with_detail("overlapping_files", json!(overlap)),
            )
        })
        .collect()
}
