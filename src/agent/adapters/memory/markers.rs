//! In-memory lock marker store.

use crate::agent::ports::{LockMarker, LockMarkerStore, MarkerResult, marker_file_name};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe in-memory marker store keyed like the filesystem adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLockMarkers {
    markers: Arc<RwLock<BTreeMap<String, LockMarker>>>,
}

impl InMemoryLockMarkers {
    /// Creates an empty marker store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a marker under an arbitrary file name, as older tooling did.
    pub fn insert_raw(&self, file_name: impl Into<String>, marker: LockMarker) {
        self.markers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file_name.into(), marker);
    }

    /// Returns the file names currently present.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        self.markers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl LockMarkerStore for InMemoryLockMarkers {
    fn write(&self, marker: &LockMarker) -> MarkerResult<()> {
        self.insert_raw(marker_file_name(&marker.path), marker.clone());
        Ok(())
    }

    fn remove(&self, path: &str) -> MarkerResult<usize> {
        let mut markers = self.markers.write().unwrap_or_else(PoisonError::into_inner);
        let before = markers.len();
        markers.retain(|_, marker| marker.path != path);
        Ok(before - markers.len())
    }

    fn list(&self) -> MarkerResult<Vec<LockMarker>> {
        Ok(self
            .markers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }
}
