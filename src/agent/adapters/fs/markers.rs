//! Lock marker files in a directory.
//!
//! Each marker is `<sha256(path)>.lock` holding `{path, agent_id,
//! timestamp}`. Removal also sweeps markers written under older naming
//! schemes by matching the recorded path.

use crate::agent::ports::{LockMarker, LockMarkerStore, MarkerError, MarkerResult, marker_file_name};
use cap_std::fs_utf8::Dir;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::{debug, warn};

const MARKER_EXTENSION: &str = ".lock";

/// Marker store writing one file per held lock.
#[derive(Debug, Clone)]
pub struct FsLockMarkers {
    dir: Arc<Dir>,
}

impl FsLockMarkers {
    /// Creates a marker store over an open directory.
    #[must_use]
    pub const fn new(dir: Arc<Dir>) -> Self {
        Self { dir }
    }

    fn marker_names(&self) -> MarkerResult<Vec<String>> {
        let entries = self.dir.entries().map_err(|err| MarkerError::io(".", err))?;
        let mut names = Vec::new();
        for entry in entries {
            let name = entry
                .and_then(|e| e.file_name())
                .map_err(|err| MarkerError::io(".", err))?;
            if name.ends_with(MARKER_EXTENSION) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_marker(&self, name: &str) -> Option<LockMarker> {
        let raw = match self.dir.read_to_string(name) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(marker = %name, error = %err, "skipping unreadable lock marker");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|err| {
                warn!(marker = %name, error = %err, "skipping malformed lock marker");
            })
            .ok()
    }

    fn delete(&self, name: &str) -> MarkerResult<bool> {
        match self.dir.remove_file(name) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(MarkerError::io(name, err)),
        }
    }
}

impl LockMarkerStore for FsLockMarkers {
    fn write(&self, marker: &LockMarker) -> MarkerResult<()> {
        let name = marker_file_name(&marker.path);
        let encoded = serde_json::to_string(marker)?;
        self.dir
            .write(&name, encoded)
            .map_err(|err| MarkerError::io(name.as_str(), err))?;
        debug!(path = %marker.path, marker = %name, "wrote lock marker");
        Ok(())
    }

    fn remove(&self, path: &str) -> MarkerResult<usize> {
        let mut removed = usize::from(self.delete(&marker_file_name(path))?);
        for name in self.marker_names()? {
            let matches = self
                .read_marker(&name)
                .is_some_and(|marker| marker.path == path);
            if matches && self.delete(&name)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn list(&self) -> MarkerResult<Vec<LockMarker>> {
        Ok(self
            .marker_names()?
            .iter()
            .filter_map(|name| self.read_marker(name))
            .collect())
    }
}
