//! Tests for the event bus service.

use super::agent;
use crate::event::adapters::InMemoryEventLog;
use crate::event::domain::{Event, EventFilter, EventType, PublishRequest};
use crate::event::ports::log::MockEventLog;
use crate::event::ports::{AsyncEventHandler, EventLogError, HandlerError};
use crate::event::services::{EventBus, Handler};
use crate::test_support::ManualClock;
use async_trait::async_trait;
use eyre::eyre;
use mockable::Clock;
use rstest::{fixture, rstest};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

type TestBus = EventBus<InMemoryEventLog, ManualClock>;

struct Harness {
    bus: TestBus,
    log: Arc<InMemoryEventLog>,
    clock: ManualClock,
}

#[fixture]
fn harness() -> Harness {
    let log = Arc::new(InMemoryEventLog::new());
    let clock = ManualClock::new();
    let bus = EventBus::new(Arc::clone(&log), Arc::new(clock.clone()), 1000);
    Harness { bus, log, clock }
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn handler(&self, label: &'static str) -> Handler {
        let calls = Arc::clone(&self.calls);
        Handler::sync(move |event: &Event| {
            calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("{label}:{}", event.event_type()));
            Ok(())
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn publish(bus: &TestBus, event_type: EventType, source: &str) -> Event {
    bus.publish(PublishRequest::new(event_type, agent(source)))
}

#[rstest]
fn handlers_run_in_subscription_order_for_their_type(harness: Harness) {
    let recorder = Recorder::default();
    harness
        .bus
        .subscribe(EventType::LockAcquired, recorder.handler("first"));
    harness
        .bus
        .subscribe(EventType::LockAcquired, recorder.handler("second"));
    harness
        .bus
        .subscribe(EventType::LockReleased, recorder.handler("other"));

    publish(&harness.bus, EventType::LockAcquired, "codex");

    assert_eq!(
        recorder.calls(),
        vec!["first:lock.acquired", "second:lock.acquired"]
    );
}

#[rstest]
fn failing_and_panicking_handlers_are_isolated(harness: Harness) {
    let recorder = Recorder::default();
    harness.bus.subscribe(
        EventType::SystemAlert,
        Handler::sync(|_: &Event| -> Result<(), HandlerError> {
            Err(HandlerError::new("boom"))
        }),
    );
    harness.bus.subscribe(
        EventType::SystemAlert,
        Handler::sync(|_: &Event| -> Result<(), HandlerError> { panic!("handler bug") }),
    );
    harness
        .bus
        .subscribe(EventType::SystemAlert, recorder.handler("survivor"));

    let event = publish(&harness.bus, EventType::SystemAlert, "system");

    assert_eq!(recorder.calls(), vec!["survivor:system.alert"]);
    assert_eq!(harness.bus.get_event(event.event_id()), Some(event));
}

#[rstest]
fn unsubscribe_stops_delivery(harness: Harness) {
    let recorder = Recorder::default();
    let subscription = harness
        .bus
        .subscribe(EventType::TaskCreated, recorder.handler("once"));
    assert_eq!(harness.bus.subscriber_count(EventType::TaskCreated), 1);

    assert!(harness.bus.unsubscribe(subscription));
    assert!(!harness.bus.unsubscribe(subscription));
    publish(&harness.bus, EventType::TaskCreated, "queue");

    assert!(recorder.calls().is_empty());
    assert_eq!(harness.bus.subscriber_count(EventType::TaskCreated), 0);
}

#[rstest]
fn published_events_are_logged(harness: Harness) {
    publish(&harness.bus, EventType::AgentRegistered, "codex");
    publish(&harness.bus, EventType::AgentHeartbeat, "codex");
    assert_eq!(harness.log.len(), 2);
}

#[rstest]
fn log_failure_does_not_abort_publish() {
    let mut log = MockEventLog::new();
    log.expect_append().times(1).returning(|_| {
        Err(EventLogError::io(
            "events.jsonl",
            std::io::Error::other("disk full"),
        ))
    });
    log.expect_read_all().returning(|| Ok(Vec::new()));
    let bus = EventBus::new(Arc::new(log), Arc::new(ManualClock::new()), 10);
    let recorder = Recorder::default();
    bus.subscribe(EventType::FileCreated, recorder.handler("seen"));

    let event = bus.publish(PublishRequest::new(EventType::FileCreated, agent("codex")));

    assert_eq!(recorder.calls(), vec!["seen:file.created"]);
    assert_eq!(bus.get_event(event.event_id()), Some(event));
}

#[rstest]
fn buses_sharing_a_log_see_each_others_events_and_acks(harness: Harness) {
    let peer = EventBus::new(
        Arc::clone(&harness.log),
        Arc::new(harness.clock.clone()),
        1000,
    );
    let event = harness.bus.publish(
        PublishRequest::new(EventType::TaskAssigned, agent("a"))
            .with_targets([agent("b")])
            .requiring_ack(),
    );

    assert_eq!(peer.get_pending_acks(&agent("b")), vec![event.clone()]);
    assert!(peer.ack_event(event.event_id(), &agent("b")));
    assert!(harness.bus.get_pending_acks(&agent("b")).is_empty());
    assert_eq!(harness.log.len(), 2);

    let broadcast = peer.publish(PublishRequest::new(EventType::SystemStartup, agent("c")));
    let replayed = harness.bus.replay_events(&agent("b"), None);
    assert_eq!(replayed.len(), 2);
    assert_eq!(replayed.last(), Some(&broadcast));
}

#[rstest]
fn repeated_ack_is_logged_once(harness: Harness) {
    let event = harness.bus.publish(
        PublishRequest::new(EventType::TaskAssigned, agent("a"))
            .with_targets([agent("b")])
            .requiring_ack(),
    );
    assert!(harness.bus.ack_event(event.event_id(), &agent("b")));
    assert!(harness.bus.ack_event(event.event_id(), &agent("b")));
    assert_eq!(harness.log.len(), 2);
}

#[rstest]
fn reopened_bus_keeps_acknowledgements(harness: Harness) -> eyre::Result<()> {
    let event = harness.bus.publish(
        PublishRequest::new(EventType::TaskAssigned, agent("a"))
            .with_targets([agent("b")])
            .requiring_ack(),
    );
    harness.bus.ack_event(event.event_id(), &agent("b"));

    let reopened = EventBus::open(
        Arc::clone(&harness.log),
        Arc::new(harness.clock.clone()),
        1000,
    )?;
    let stored = reopened
        .get_event(event.event_id())
        .ok_or_else(|| eyre!("event missing after reopen"))?;
    eyre::ensure!(stored.is_fully_acked());
    eyre::ensure!(reopened.get_pending_acks(&agent("b")).is_empty());
    Ok(())
}

#[rstest]
fn targeted_ack_tracking(harness: Harness) -> eyre::Result<()> {
    let event = harness.bus.publish(
        PublishRequest::new(EventType::TaskAssigned, agent("a"))
            .with_targets([agent("b"), agent("c")])
            .requiring_ack(),
    );
    let id = event.event_id();
    let fully_acked = || {
        harness
            .bus
            .get_event(id)
            .is_some_and(|stored| stored.is_fully_acked())
    };

    eyre::ensure!(harness.bus.get_pending_acks(&agent("b")).len() == 1);
    eyre::ensure!(!harness.bus.ack_event(id, &agent("d")));
    eyre::ensure!(harness.bus.ack_event(id, &agent("b")));
    eyre::ensure!(!fully_acked());
    eyre::ensure!(harness.bus.get_pending_acks(&agent("b")).is_empty());
    eyre::ensure!(harness.bus.get_pending_acks(&agent("c")).len() == 1);
    eyre::ensure!(harness.bus.ack_event(id, &agent("c")));
    eyre::ensure!(fully_acked());
    eyre::ensure!(harness.bus.get_pending_acks(&agent("c")).is_empty());
    Ok(())
}

#[rstest]
fn ack_is_refused_when_not_required_or_unknown(harness: Harness) {
    let plain = publish(&harness.bus, EventType::FileModified, "codex");
    assert!(!harness.bus.ack_event(plain.event_id(), &agent("codex")));
    assert!(!harness
        .bus
        .ack_event(crate::event::domain::EventId::new(), &agent("codex")));
}

#[rstest]
fn history_is_bounded_and_drops_oldest() {
    let bus = EventBus::new(
        Arc::new(InMemoryEventLog::new()),
        Arc::new(ManualClock::new()),
        3,
    );
    let first = bus.publish(
        PublishRequest::new(EventType::TaskAssigned, agent("a"))
            .with_targets([agent("b")])
            .requiring_ack(),
    );
    for _ in 0..3 {
        bus.publish(PublishRequest::new(EventType::AgentHeartbeat, agent("a")));
    }

    let history = bus.get_event_history(&EventFilter::new(), 10);
    assert_eq!(history.len(), 3);
    assert!(bus.get_event(first.event_id()).is_none());
    assert!(bus.get_pending_acks(&agent("b")).is_empty());
}

#[rstest]
fn history_returns_newest_matches_oldest_first(harness: Harness) {
    let events: Vec<Event> = (0..5)
        .map(|_| publish(&harness.bus, EventType::LockAcquired, "codex"))
        .collect();
    publish(&harness.bus, EventType::LockReleased, "codex");

    let history = harness.bus.get_event_history(
        &EventFilter::new().with_type(EventType::LockAcquired),
        2,
    );

    let newest: Vec<Event> = events.into_iter().skip(3).collect();
    assert_eq!(history, newest);
}

#[rstest]
fn replay_returns_broadcasts_and_own_events_since_bound(harness: Harness) -> eyre::Result<()> {
    publish(&harness.bus, EventType::SystemStartup, "system");
    harness.clock.advance(Duration::from_secs(60));
    let since = harness.clock.utc();
    let broadcast = publish(&harness.bus, EventType::SystemAlert, "system");
    let mine = harness.bus.publish(
        PublishRequest::new(EventType::TaskAssigned, agent("queue")).with_targets([agent("b")]),
    );
    harness.bus.publish(
        PublishRequest::new(EventType::TaskAssigned, agent("queue")).with_targets([agent("c")]),
    );

    let replayed = harness.bus.replay_events(&agent("b"), Some(since));

    eyre::ensure!(replayed == vec![broadcast, mine], "unexpected replay {replayed:?}");
    eyre::ensure!(harness.bus.replay_events(&agent("b"), None).len() == 3);
    Ok(())
}

#[rstest]
fn open_seeds_history_and_pending_acks_from_log(harness: Harness) -> eyre::Result<()> {
    let targeted = harness.bus.publish(
        PublishRequest::new(EventType::ConflictEscalated, agent("detector"))
            .with_targets([agent("human")])
            .requiring_ack(),
    );
    publish(&harness.bus, EventType::SystemStartup, "system");

    let reopened = EventBus::open(
        Arc::clone(&harness.log),
        Arc::new(harness.clock.clone()),
        1000,
    )?;

    eyre::ensure!(reopened.get_event_history(&EventFilter::new(), 10).len() == 2);
    let pending = reopened.get_pending_acks(&agent("human"));
    eyre::ensure!(pending == vec![targeted]);
    Ok(())
}

struct Forwarder {
    sender: mpsc::UnboundedSender<Event>,
}

#[async_trait]
impl AsyncEventHandler for Forwarder {
    async fn handle(&self, event: Event) -> Result<(), HandlerError> {
        self.sender
            .send(event)
            .map_err(|err| HandlerError::new(err.to_string()))
    }
}

#[rstest]
#[tokio::test]
async fn async_handlers_are_spawned_without_blocking_publish() -> eyre::Result<()> {
    let bus = EventBus::new(
        Arc::new(InMemoryEventLog::new()),
        Arc::new(ManualClock::new()),
        10,
    );
    let (sender, mut receiver) = mpsc::unbounded_channel();
    bus.subscribe(
        EventType::HealingExecuted,
        Handler::asynchronous(Forwarder { sender }),
    );

    let published = bus.publish(PublishRequest::new(
        EventType::HealingExecuted,
        agent("healer"),
    ));

    let delivered = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await?
        .ok_or_else(|| eyre!("handler channel closed"))?;
    eyre::ensure!(delivered == published);
    Ok(())
}

#[rstest]
fn async_handlers_are_skipped_without_runtime(harness: Harness) {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    harness.bus.subscribe(
        EventType::HealingExecuted,
        Handler::asynchronous(Forwarder { sender }),
    );

    publish(&harness.bus, EventType::HealingExecuted, "healer");

    assert!(receiver.try_recv().is_err());
}
