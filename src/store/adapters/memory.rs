//! In-memory snapshot store for tests and single-process embedding.

use crate::store::{Snapshot, SnapshotStore, StoreResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Thread-safe in-memory snapshot store.
///
/// Clones share the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotStore<S> {
    state: Arc<Mutex<S>>,
}

impl<S: Snapshot> InMemorySnapshotStore<S> {
    /// Creates a store holding `S::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: S) -> Self {
        Self {
            state: Arc::new(Mutex::new(snapshot)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Snapshot> SnapshotStore<S> for InMemorySnapshotStore<S> {
    fn read(&self) -> StoreResult<S> {
        Ok(self.lock().clone())
    }

    fn update<R, F>(&self, mutate: F) -> StoreResult<R>
    where
        F: FnOnce(&mut S) -> R,
    {
        let mut guard = self.lock();
        Ok(mutate(&mut guard))
    }
}
