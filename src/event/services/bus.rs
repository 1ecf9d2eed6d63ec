//! Publish/subscribe service with bounded history and acknowledgements.

use crate::agent::domain::AgentId;
use crate::event::domain::{
    Acknowledgement, Event, EventFilter, EventId, EventType, LogRecord, PublishRequest,
    SubscriptionId,
};
use crate::event::ports::{AsyncEventHandler, EventHandler, EventLog, EventLogResult};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::{BTreeMap, VecDeque};
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Default number of events retained in memory.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// A subscriber, run inline or on the tokio runtime.
#[derive(Clone)]
pub enum Handler {
    /// Invoked inline during `publish`.
    Sync(Arc<dyn EventHandler>),
    /// Spawned without being awaited.
    Async(Arc<dyn AsyncEventHandler>),
}

impl Handler {
    /// Wraps a synchronous subscriber.
    #[must_use]
    pub fn sync(handler: impl EventHandler + 'static) -> Self {
        Self::Sync(Arc::new(handler))
    }

    /// Wraps an asynchronous subscriber.
    #[must_use]
    pub fn asynchronous(handler: impl AsyncEventHandler + 'static) -> Self {
        Self::Async(Arc::new(handler))
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Sync(_) => "sync",
            Self::Async(_) => "async",
        }
    }
}

struct Subscription {
    id: SubscriptionId,
    handler: Handler,
}

#[derive(Default)]
struct BusState {
    history: VecDeque<Event>,
    pending: Vec<EventId>,
    subscribers: BTreeMap<EventType, Vec<Subscription>>,
    next_subscription: u64,
}

impl BusState {
    fn record(&mut self, event: Event, limit: usize) {
        if event.requires_ack() && !event.is_broadcast() && !event.is_fully_acked() {
            self.pending.push(event.event_id());
        }
        self.history.push_back(event);
        while self.history.len() > limit {
            if let Some(evicted) = self.history.pop_front() {
                self.pending.retain(|id| *id != evicted.event_id());
            }
        }
    }

    /// Replaces the history with the newest logged events, acknowledgements
    /// folded in. Events this process holds that the log lacks (a failed
    /// append) are kept after the logged ones, and acknowledgements seen
    /// only here are merged back.
    fn rebuild(&mut self, records: Vec<LogRecord>, limit: usize) {
        let mut logged: Vec<Event> = Vec::new();
        let mut slots: BTreeMap<EventId, usize> = BTreeMap::new();
        for record in records {
            match record {
                LogRecord::Published(event) => {
                    if !slots.contains_key(&event.event_id()) {
                        slots.insert(event.event_id(), logged.len());
                        logged.push(event);
                    }
                }
                LogRecord::Acknowledged(ack) => {
                    let slot = slots.get(&ack.event_id()).copied();
                    if let Some(event) = slot.and_then(|found| logged.get_mut(found)) {
                        event.acknowledge(ack.agent_id());
                    }
                }
            }
        }

        let mut unlogged = Vec::new();
        for local in mem::take(&mut self.history) {
            let slot = slots.get(&local.event_id()).copied();
            let Some(event) = slot.and_then(|found| logged.get_mut(found)) else {
                unlogged.push(local);
                continue;
            };
            for agent in local.acked_by() {
                event.acknowledge(agent);
            }
        }

        self.pending.clear();
        for event in logged.into_iter().chain(unlogged) {
            self.record(event, limit);
        }
    }

    fn find_mut(&mut self, event_id: EventId) -> Option<&mut Event> {
        self.history
            .iter_mut()
            .rev()
            .find(|event| event.event_id() == event_id)
    }
}

/// Event bus owning the event history.
///
/// Handlers run outside the internal lock, so a handler may publish or
/// subscribe re-entrantly.
pub struct EventBus<L, C>
where
    L: EventLog,
    C: Clock + Send + Sync,
{
    log: Arc<L>,
    clock: Arc<C>,
    history_limit: usize,
    state: Mutex<BusState>,
}

impl<L, C> EventBus<L, C>
where
    L: EventLog,
    C: Clock + Send + Sync,
{
    /// Creates a bus with empty history.
    #[must_use]
    pub fn new(log: Arc<L>, clock: Arc<C>, history_limit: usize) -> Self {
        Self {
            log,
            clock,
            history_limit: history_limit.max(1),
            state: Mutex::new(BusState::default()),
        }
    }

    /// Creates a bus whose history is seeded with the newest events in the
    /// log, acknowledgements applied.
    ///
    /// # Errors
    ///
    /// Returns [`crate::event::ports::EventLogError`] when the log cannot be
    /// read.
    pub fn open(log: Arc<L>, clock: Arc<C>, history_limit: usize) -> EventLogResult<Self> {
        let bus = Self::new(log, clock, history_limit);
        let records = bus.log.read_all()?;
        {
            let mut state = bus.lock_state();
            state.rebuild(records, bus.history_limit);
            info!(
                events = state.history.len(),
                pending = state.pending.len(),
                "seeded event history from log"
            );
        }
        Ok(bus)
    }

    fn lock_state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Picks up events and acknowledgements other processes have logged.
    /// An unreadable log leaves the current history in place.
    fn refresh(&self) -> MutexGuard<'_, BusState> {
        let records = self.log.read_all();
        let mut state = self.lock_state();
        match records {
            Ok(found) => state.rebuild(found, self.history_limit),
            Err(err) => warn!(error = %err, "failed to refresh event history from log"),
        }
        state
    }

    /// Returns the history capacity.
    #[must_use]
    pub const fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Registers a handler for one event type. Handlers for a type run in
    /// subscription order.
    pub fn subscribe(&self, event_type: EventType, handler: Handler) -> SubscriptionId {
        let mut state = self.lock_state();
        state.next_subscription += 1;
        let id = SubscriptionId::new(state.next_subscription);
        debug!(event_type = %event_type, subscription = %id, kind = handler.kind(), "subscribed");
        state
            .subscribers
            .entry(event_type)
            .or_default()
            .push(Subscription { id, handler });
        id
    }

    /// Removes a subscription. Returns `false` when it is unknown.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        let mut state = self.lock_state();
        let mut removed = false;
        state.subscribers.retain(|_, subscriptions| {
            let before = subscriptions.len();
            subscriptions.retain(|entry| entry.id != subscription);
            removed |= subscriptions.len() != before;
            !subscriptions.is_empty()
        });
        removed
    }

    /// Returns how many handlers are subscribed to `event_type`.
    #[must_use]
    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        self.lock_state()
            .subscribers
            .get(&event_type)
            .map_or(0, Vec::len)
    }

    /// Publishes an event and returns it.
    ///
    /// The event is recorded in history and appended to the log; a log
    /// failure is logged and does not abort publication. Synchronous
    /// handlers run inline with failures and panics isolated per handler.
    /// Asynchronous handlers are spawned on the current tokio runtime and
    /// skipped with a warning when there is none.
    pub fn publish(&self, request: PublishRequest) -> Event {
        let event = Event::new(request, self.clock.utc());
        let handlers: Vec<Handler> = {
            let mut state = self.lock_state();
            state.record(event.clone(), self.history_limit);
            state
                .subscribers
                .get(&event.event_type())
                .map(|subscriptions| {
                    subscriptions
                        .iter()
                        .map(|entry| entry.handler.clone())
                        .collect()
                })
                .unwrap_or_default()
        };

        if let Err(err) = self.log.append(&LogRecord::from(event.clone())) {
            warn!(event_id = %event.event_id(), error = %err, "failed to append event to log");
        }
        debug!(
            event_id = %event.event_id(),
            event_type = %event.event_type(),
            source = %event.source_agent(),
            handlers = handlers.len(),
            "published event"
        );

        for handler in handlers {
            match handler {
                Handler::Sync(sync) => run_sync(sync.as_ref(), &event),
                Handler::Async(asynchronous) => spawn_async(asynchronous, &event),
            }
        }
        event
    }

    /// Records `agent_id`'s acknowledgement and appends it to the log so
    /// other processes see it.
    ///
    /// Returns `false` when the event is not in history, does not require
    /// acknowledgement, or is not addressed to `agent_id`. A log failure is
    /// logged; the acknowledgement still holds in this process.
    pub fn ack_event(&self, event_id: EventId, agent_id: &AgentId) -> bool {
        let fresh = {
            let mut state = self.refresh();
            let Some(event) = state.find_mut(event_id) else {
                return false;
            };
            let repeated = event.acked_by().contains(agent_id);
            if !event.acknowledge(agent_id) {
                return false;
            }
            if event.is_fully_acked() {
                state.pending.retain(|pending| *pending != event_id);
                debug!(event_id = %event_id, "event fully acknowledged");
            }
            !repeated
        };
        if fresh {
            let ack = Acknowledgement::new(event_id, agent_id.clone(), self.clock.utc());
            if let Err(err) = self.log.append(&LogRecord::from(ack)) {
                warn!(
                    event_id = %event_id,
                    agent_id = %agent_id,
                    error = %err,
                    "failed to append acknowledgement to log"
                );
            }
        }
        true
    }

    /// Returns the event with `event_id`, if still in history.
    #[must_use]
    pub fn get_event(&self, event_id: EventId) -> Option<Event> {
        self.refresh()
            .history
            .iter()
            .find(|event| event.event_id() == event_id)
            .cloned()
    }

    /// Returns targeted events still awaiting `agent_id`'s acknowledgement,
    /// oldest first.
    #[must_use]
    pub fn get_pending_acks(&self, agent_id: &AgentId) -> Vec<Event> {
        let state = self.refresh();
        state
            .history
            .iter()
            .filter(|event| state.pending.contains(&event.event_id()))
            .filter(|event| event.awaits_ack_from(agent_id))
            .cloned()
            .collect()
    }

    /// Returns at most `limit` of the newest events matching `filter`,
    /// oldest first.
    #[must_use]
    pub fn get_event_history(&self, filter: &EventFilter, limit: usize) -> Vec<Event> {
        let state = self.refresh();
        let mut matched: Vec<Event> = state
            .history
            .iter()
            .rev()
            .filter(|event| filter.matches(event))
            .take(limit)
            .cloned()
            .collect();
        matched.reverse();
        matched
    }

    /// Returns broadcasts and events targeted at `agent_id`, published at or
    /// after `since` when given, oldest first.
    #[must_use]
    pub fn replay_events(&self, agent_id: &AgentId, since: Option<DateTime<Utc>>) -> Vec<Event> {
        let mut filter = EventFilter::new().with_target(agent_id.clone());
        if let Some(bound) = since {
            filter = filter.with_since(bound);
        }
        self.refresh()
            .history
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect()
    }
}

fn run_sync(handler: &dyn EventHandler, event: &Event) {
    match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            warn!(event_id = %event.event_id(), error = %err, "event handler failed");
        }
        Err(_) => {
            warn!(event_id = %event.event_id(), "event handler panicked");
        }
    }
}

fn spawn_async(handler: Arc<dyn AsyncEventHandler>, event: &Event) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!(
            event_id = %event.event_id(),
            "no tokio runtime; skipping async event handler"
        );
        return;
    };
    let owned = event.clone();
    // Dropping the join handle detaches the task.
    drop(runtime.spawn(async move {
        let event_id = owned.event_id();
        if let Err(err) = handler.handle(owned).await {
            warn!(event_id = %event_id, error = %err, "async event handler failed");
        }
    }));
}
