//! One coordinator, bus, queue and detector wired to shared state.
//!
//! A process builds a [`Coordination`] once and passes it to whatever
//! needs it. The filesystem backend keeps every document under
//! `<project_root>/<state_dir>/`; the memory backend keeps them in the
//! process.

use crate::agent::adapters::fs::{FsLockMarkers, FsProjectTree};
use crate::agent::adapters::memory::{InMemoryLockMarkers, InMemoryProjectTree};
use crate::agent::domain::{Agent, AgentId, CoordinationState};
use crate::agent::ports::{LockMarkerStore, ProjectTree};
use crate::agent::services::{
    AcquireLockRequest, AgentCoordinator, CoordinatorError, CoordinatorResult,
};
use crate::config::{ConfigError, CoordinationConfig};
use crate::conflict::domain::ConflictLedger;
use crate::conflict::services::ConflictDetector;
use crate::event::adapters::{InMemoryEventLog, JsonLinesEventLog};
use crate::event::ports::{EventLog, EventLogError};
use crate::event::services::EventBus;
use crate::store::adapters::{InMemorySnapshotStore, JsonFileStore, StateDir};
use crate::store::{SnapshotStore, StoreError};
use crate::task::domain::TaskGraph;
use crate::task::services::TaskQueue;
use mockable::{Clock, DefaultClock};
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Agent and lock snapshot document.
pub const STATE_DOCUMENT: &str = "state.json";
/// Task snapshot document.
pub const TASKS_DOCUMENT: &str = "tasks.json";
/// Conflict snapshot document.
pub const CONFLICTS_DOCUMENT: &str = "conflicts.json";
/// Append-only event log.
pub const EVENT_LOG: &str = "events.jsonl";
/// Directory of lock marker files.
pub const LOCK_MARKER_DIR: &str = "locks";

/// Errors raised while opening a coordination context.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Configuration could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The state directory or a document could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Coordinator start-up housekeeping failed.
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    /// The event log could not be read.
    #[error(transparent)]
    EventLog(#[from] EventLogError),
}

/// Storage chosen for every component of a context.
pub trait Backend<C: Clock + Send + Sync> {
    /// Agent and lock snapshot store.
    type State: SnapshotStore<CoordinationState>;
    /// Lock marker store.
    type Markers: LockMarkerStore;
    /// View of the project tree.
    type Tree: ProjectTree;
    /// Task snapshot store.
    type Tasks: SnapshotStore<TaskGraph>;
    /// Conflict snapshot store.
    type Conflicts: SnapshotStore<ConflictLedger>;
    /// Event log.
    type Log: EventLog;
}

/// JSON documents under the state directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileBackend;

impl<C: Clock + Send + Sync> Backend<C> for FileBackend {
    type State = JsonFileStore<CoordinationState, C>;
    type Markers = FsLockMarkers;
    type Tree = FsProjectTree;
    type Tasks = JsonFileStore<TaskGraph, C>;
    type Conflicts = JsonFileStore<ConflictLedger, C>;
    type Log = JsonLinesEventLog;
}

/// Process-local state.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackend;

impl<C: Clock + Send + Sync> Backend<C> for MemoryBackend {
    type State = InMemorySnapshotStore<CoordinationState>;
    type Markers = InMemoryLockMarkers;
    type Tree = InMemoryProjectTree;
    type Tasks = InMemorySnapshotStore<TaskGraph>;
    type Conflicts = InMemorySnapshotStore<ConflictLedger>;
    type Log = InMemoryEventLog;
}

/// Coordinator over the backend's stores.
pub type CoordinatorOf<B, C> = AgentCoordinator<
    <B as Backend<C>>::State,
    <B as Backend<C>>::Markers,
    <B as Backend<C>>::Tree,
    C,
>;

/// Event bus over the backend's log.
pub type BusOf<B, C> = EventBus<<B as Backend<C>>::Log, C>;

/// Task queue over the backend's task store.
pub type QueueOf<B, C> = TaskQueue<<B as Backend<C>>::Tasks, C>;

/// Conflict detector reading the backend's coordinator.
pub type DetectorOf<B, C> =
    ConflictDetector<<B as Backend<C>>::Conflicts, CoordinatorOf<B, C>, C>;

/// Coordination context persisted under a project root.
pub type FileCoordination<C = DefaultClock> = Coordination<FileBackend, C>;

/// Coordination context held in memory.
pub type MemoryCoordination<C = DefaultClock> = Coordination<MemoryBackend, C>;

/// The four coordination services sharing one configuration and clock.
pub struct Coordination<B, C>
where
    B: Backend<C>,
    C: Clock + Send + Sync,
{
    config: CoordinationConfig,
    coordinator: Arc<CoordinatorOf<B, C>>,
    bus: Arc<BusOf<B, C>>,
    queue: QueueOf<B, C>,
    detector: DetectorOf<B, C>,
    backend: PhantomData<B>,
}

impl<C: Clock + Send + Sync> Coordination<FileBackend, C> {
    /// Opens (creating if needed) the state directory named by `config` and
    /// loads every document in it.
    ///
    /// Locks that expired while no process was running are purged, and the
    /// bus history is seeded from the event log.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the directory cannot be created, a
    /// document is unreadable, or the event log cannot be read.
    pub fn open(config: CoordinationConfig, clock: Arc<C>) -> Result<Self, ContextError> {
        let state = StateDir::open(config.project_root(), config.state_dir())?;
        let markers = Arc::new(FsLockMarkers::new(Arc::new(state.subdir(LOCK_MARKER_DIR)?)));
        let coordinator: Arc<CoordinatorOf<FileBackend, C>> = Arc::new(AgentCoordinator::open(
            Arc::new(state.document(STATE_DOCUMENT, Arc::clone(&clock))),
            markers,
            Arc::new(FsProjectTree::new(state.project_dir())),
            Arc::clone(&clock),
        )?);
        let bus = Arc::new(EventBus::open(
            Arc::new(JsonLinesEventLog::new(state.shared_dir(), EVENT_LOG)),
            Arc::clone(&clock),
            config.history_limit(),
        )?);
        let queue = TaskQueue::new(
            Arc::new(state.document(TASKS_DOCUMENT, Arc::clone(&clock))),
            Arc::clone(&clock),
        );
        let detector = ConflictDetector::new(
            Arc::new(state.document(CONFLICTS_DOCUMENT, Arc::clone(&clock))),
            Arc::clone(&coordinator),
            clock,
        );
        info!(state_dir = %state.path(), "opened coordination context");
        Ok(Self {
            config,
            coordinator,
            bus,
            queue,
            detector,
            backend: PhantomData,
        })
    }

    /// Opens the context for the project root named in the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the configuration or any document
    /// cannot be read.
    pub fn from_env(clock: Arc<C>) -> Result<Self, ContextError> {
        Self::open(CoordinationConfig::from_env()?, clock)
    }
}

impl<C: Clock + Send + Sync> Coordination<MemoryBackend, C> {
    /// Creates an empty in-memory context. Its project tree starts empty;
    /// add paths through the coordinator's [`AgentCoordinator::project_tree`].
    #[must_use]
    pub fn in_memory(config: CoordinationConfig, clock: Arc<C>) -> Self {
        let coordinator: Arc<CoordinatorOf<MemoryBackend, C>> = Arc::new(AgentCoordinator::new(
            Arc::new(InMemorySnapshotStore::new()),
            Arc::new(InMemoryLockMarkers::new()),
            Arc::new(InMemoryProjectTree::new()),
            Arc::clone(&clock),
        ));
        let bus = Arc::new(EventBus::new(
            Arc::new(InMemoryEventLog::new()),
            Arc::clone(&clock),
            config.history_limit(),
        ));
        let queue = TaskQueue::new(Arc::new(InMemorySnapshotStore::new()), Arc::clone(&clock));
        let detector = ConflictDetector::new(
            Arc::new(InMemorySnapshotStore::new()),
            Arc::clone(&coordinator),
            clock,
        );
        Self {
            config,
            coordinator,
            bus,
            queue,
            detector,
            backend: PhantomData,
        }
    }
}

impl<B, C> Coordination<B, C>
where
    B: Backend<C>,
    C: Clock + Send + Sync,
{
    /// Returns the configuration the context was built from.
    #[must_use]
    pub const fn config(&self) -> &CoordinationConfig {
        &self.config
    }

    /// Returns the agent coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &Arc<CoordinatorOf<B, C>> {
        &self.coordinator
    }

    /// Returns the event bus.
    #[must_use]
    pub const fn bus(&self) -> &Arc<BusOf<B, C>> {
        &self.bus
    }

    /// Returns the task queue.
    #[must_use]
    pub const fn queue(&self) -> &QueueOf<B, C> {
        &self.queue
    }

    /// Returns the conflict detector.
    #[must_use]
    pub const fn detector(&self) -> &DetectorOf<B, C> {
        &self.detector
    }

    /// Builds an exclusive lock request carrying the configured TTL.
    #[must_use]
    pub fn lock_request(&self, agent_id: AgentId, path: impl Into<String>) -> AcquireLockRequest {
        AcquireLockRequest::new(agent_id, path).with_ttl(self.config.lock_ttl())
    }

    /// Returns agents whose last heartbeat falls inside the configured
    /// activity window.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Store`] when the snapshot cannot be read.
    pub fn active_agents(&self) -> CoordinatorResult<Vec<Agent>> {
        self.coordinator
            .active_agents(self.config.heartbeat_timeout())
    }
}
