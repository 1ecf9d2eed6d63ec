//! Port contract for whole-document snapshot persistence.

use super::StoreResult;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

/// State that can be persisted as one JSON document.
///
/// Equality is used to skip writes when an operation leaves the snapshot
/// untouched.
pub trait Snapshot: Default + Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send {}

impl<T> Snapshot for T where
    T: Default + Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send
{
}

/// Snapshot persistence contract.
///
/// Implementations must make [`SnapshotStore::update`] a single serialized
/// read-modify-write: no other writer may interleave between the read and
/// the write, in this process or any other.
pub trait SnapshotStore<S: Snapshot>: Send + Sync {
    /// Returns the current snapshot, or `S::default()` when none exists.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError`] when the document cannot be read or is
    /// not valid JSON.
    fn read(&self) -> StoreResult<S>;

    /// Applies `mutate` to the current snapshot and persists the result if
    /// it changed.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError`] when the document cannot be read,
    /// decoded, encoded, or replaced.
    fn update<R, F>(&self, mutate: F) -> StoreResult<R>
    where
        F: FnOnce(&mut S) -> R;
}
