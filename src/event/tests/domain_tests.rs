//! Tests for event domain values.

use super::agent;
use crate::event::domain::{Event, EventFilter, EventType, PublishRequest};
use crate::test_support::ManualClock;
use mockable::Clock;
use rstest::rstest;
use std::time::Duration;

#[rstest]
fn every_event_type_round_trips_through_its_wire_name() -> eyre::Result<()> {
    for event_type in EventType::ALL {
        eyre::ensure!(EventType::try_from(event_type.as_str())? == event_type);
        let encoded = serde_json::to_string(&event_type)?;
        eyre::ensure!(encoded == format!("\"{}\"", event_type.as_str()));
    }
    Ok(())
}

#[rstest]
#[case(EventType::LockAcquired, "lock")]
#[case(EventType::PipelineStageCompleted, "pipeline")]
#[case(EventType::HealingExecuted, "system")]
fn event_type_category(#[case] event_type: EventType, #[case] expected: &str) {
    assert_eq!(event_type.category(), expected);
}

#[rstest]
fn unknown_event_type_is_rejected() {
    assert!(EventType::try_from("lock.stolen").is_err());
}

#[rstest]
fn broadcast_is_for_everyone() {
    let clock = ManualClock::new();
    let event = Event::new(
        PublishRequest::new(EventType::SystemAlert, agent("system")),
        clock.utc(),
    );
    assert!(event.is_broadcast());
    assert!(event.is_for(&agent("anyone")));
    assert!(event.is_fully_acked());
}

#[rstest]
fn targeted_event_needs_every_target_to_ack() {
    let clock = ManualClock::new();
    let mut event = Event::new(
        PublishRequest::new(EventType::TaskAssigned, agent("a"))
            .with_targets([agent("b"), agent("c")])
            .requiring_ack(),
        clock.utc(),
    );

    assert!(!event.is_for(&agent("d")));
    assert!(!event.acknowledge(&agent("d")));
    assert!(event.acknowledge(&agent("b")));
    assert!(!event.is_fully_acked());
    assert!(event.awaits_ack_from(&agent("c")));
    assert!(event.acknowledge(&agent("c")));
    assert!(event.is_fully_acked());
}

#[rstest]
fn broadcast_requiring_ack_needs_one_ack() {
    let clock = ManualClock::new();
    let mut event = Event::new(
        PublishRequest::new(EventType::ConflictEscalated, agent("detector")).requiring_ack(),
        clock.utc(),
    );
    assert!(!event.is_fully_acked());
    assert!(event.acknowledge(&agent("human")));
    assert!(event.is_fully_acked());
}

#[rstest]
fn event_round_trips_through_json() -> eyre::Result<()> {
    let clock = ManualClock::new();
    let mut event = Event::new(
        PublishRequest::new(EventType::FileModified, agent("codex"))
            .with_data(serde_json::json!({"path": "src/a.rs"}))
            .with_targets([agent("claude")])
            .with_priority(3)
            .requiring_ack(),
        clock.utc(),
    );
    event.acknowledge(&agent("claude"));

    let decoded: Event = serde_json::from_str(&serde_json::to_string(&event)?)?;
    eyre::ensure!(decoded == event);
    Ok(())
}

#[rstest]
fn filter_combines_criteria() {
    let clock = ManualClock::new();
    let early = Event::new(
        PublishRequest::new(EventType::LockAcquired, agent("codex")),
        clock.utc(),
    );
    clock.advance(Duration::from_secs(10));
    let cutoff = clock.utc();
    let late = Event::new(
        PublishRequest::new(EventType::LockAcquired, agent("codex")).with_targets([agent("b")]),
        clock.utc(),
    );

    let filter = EventFilter::new()
        .with_type(EventType::LockAcquired)
        .with_source(agent("codex"))
        .with_since(cutoff);
    assert!(!filter.matches(&early));
    assert!(filter.matches(&late));
    assert!(!filter.clone().with_target(agent("c")).matches(&late));
    assert!(!EventFilter::new().with_type(EventType::LockReleased).matches(&late));
}
