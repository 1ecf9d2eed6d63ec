//! Port for externally readable lock marker files.
//!
//! Every held lock is mirrored by a small marker record so tools that do
//! not link this crate (editors, git hooks) can see who holds a path.

use crate::agent::domain::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Marker record mirrored for each held lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMarker {
    /// Locked path.
    pub path: String,
    /// Holder.
    pub agent_id: AgentId,
    /// When the marker was written.
    pub timestamp: DateTime<Utc>,
}

/// Returns the marker file name for `path`: the hex SHA-256 of the path
/// followed by `.lock`.
#[must_use]
pub fn marker_file_name(path: &str) -> String {
    format!("{:x}.lock", Sha256::digest(path.as_bytes()))
}

/// Result type for marker operations.
pub type MarkerResult<T> = Result<T, MarkerError>;

/// Marker persistence contract.
pub trait LockMarkerStore: Send + Sync {
    /// Writes (or overwrites) the marker for `marker.path`.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError`] when the marker cannot be encoded or written.
    fn write(&self, marker: &LockMarker) -> MarkerResult<()>;

    /// Removes every marker whose recorded path equals `path`, whatever its
    /// file name, and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError`] when the marker directory cannot be listed or
    /// a matching marker cannot be deleted. Unreadable markers are skipped.
    fn remove(&self, path: &str) -> MarkerResult<usize>;

    /// Returns every readable marker.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError`] when the marker directory cannot be listed.
    fn list(&self) -> MarkerResult<Vec<LockMarker>>;
}

/// Errors returned by marker store implementations.
#[derive(Debug, Error)]
pub enum MarkerError {
    /// Marker file access failed.
    #[error("marker file {file}: {source}")]
    Io {
        /// Marker file name.
        file: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Marker could not be encoded.
    #[error("failed to encode marker: {0}")]
    Encode(#[from] serde_json::Error),
}

impl MarkerError {
    /// Wraps an I/O failure on the named marker file.
    #[must_use]
    pub fn io(file: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            file: file.into(),
            source,
        }
    }
}
