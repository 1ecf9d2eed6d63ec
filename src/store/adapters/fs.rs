//! Filesystem snapshot store backed by JSON documents.
//!
//! Every document `<name>` gets a sidecar `.<name>.lock` file. Reads hold a
//! shared advisory lock on it, updates hold an exclusive one for the whole
//! read-modify-write, and writes land in `<name>.tmp` before an atomic
//! rename over the document.

use crate::store::{Snapshot, SnapshotStore, StoreError, StoreResult};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::OpenOptions;
use cap_std::fs_utf8::Dir;
use fs2::FileExt;
use mockable::Clock;
use serde_json::Value;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handle on the coordination state directory under a project root.
#[derive(Debug, Clone)]
pub struct StateDir {
    path: Utf8PathBuf,
    root: Arc<Dir>,
    dir: Arc<Dir>,
}

impl StateDir {
    /// Opens `<project_root>/<name>`, creating the state directory if it does
    /// not exist. The project root itself must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the project root cannot be opened or
    /// the state directory cannot be created.
    pub fn open(project_root: &Utf8Path, name: &str) -> StoreResult<Self> {
        let root = Dir::open_ambient_dir(project_root, ambient_authority())
            .map_err(|err| StoreError::io(project_root.as_str(), err))?;
        root.create_dir_all(name)
            .map_err(|err| StoreError::io(name, err))?;
        let dir = root
            .open_dir(name)
            .map_err(|err| StoreError::io(name, err))?;
        Ok(Self {
            path: project_root.join(name),
            root: Arc::new(root),
            dir: Arc::new(dir),
        })
    }

    /// Returns the absolute or root-relative path of the state directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the capability handle on the state directory.
    #[must_use]
    pub fn dir(&self) -> &Dir {
        &self.dir
    }

    /// Returns a shared handle on the state directory for adapters that
    /// keep their own files in it.
    #[must_use]
    pub fn shared_dir(&self) -> Arc<Dir> {
        Arc::clone(&self.dir)
    }

    /// Returns a shared handle on the project root the state directory
    /// lives in.
    #[must_use]
    pub fn project_dir(&self) -> Arc<Dir> {
        Arc::clone(&self.root)
    }

    /// Opens a subdirectory, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory cannot be created or
    /// opened.
    pub fn subdir(&self, name: &str) -> StoreResult<Dir> {
        self.dir
            .create_dir_all(name)
            .map_err(|err| StoreError::io(name, err))?;
        self.dir
            .open_dir(name)
            .map_err(|err| StoreError::io(name, err))
    }

    /// Creates a JSON document store for `document` in this directory.
    #[must_use]
    pub fn document<S: Snapshot, C: Clock + Send + Sync>(
        &self,
        document: impl Into<String>,
        clock: Arc<C>,
    ) -> JsonFileStore<S, C> {
        JsonFileStore::new(Arc::clone(&self.dir), document, clock)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardMode {
    Shared,
    Exclusive,
}

/// Advisory lock held on a document's sidecar file until dropped.
struct DocumentGuard {
    file: std::fs::File,
    document: String,
}

impl DocumentGuard {
    fn acquire(dir: &Dir, document: &str, mode: GuardMode) -> StoreResult<Self> {
        let sidecar = format!(".{document}.lock");
        let mut options = OpenOptions::new();
        options.create(true).read(true).write(true);
        let file = dir
            .open_with(&sidecar, &options)
            .map_err(|err| StoreError::io(sidecar.as_str(), err))?
            .into_std();
        let locked = match mode {
            GuardMode::Shared => FileExt::lock_shared(&file),
            GuardMode::Exclusive => FileExt::lock_exclusive(&file),
        };
        locked.map_err(|err| StoreError::io(sidecar.as_str(), err))?;
        Ok(Self {
            file,
            document: document.to_owned(),
        })
    }
}

impl Drop for DocumentGuard {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            warn!(document = %self.document, error = %err, "failed to release document lock");
        }
    }
}

/// Snapshot store persisting `S` as one JSON document.
///
/// The written document is the snapshot's JSON object plus an `updated_at`
/// timestamp.
pub struct JsonFileStore<S, C> {
    dir: Arc<Dir>,
    document: String,
    clock: Arc<C>,
    _snapshot: PhantomData<fn() -> S>,
}

impl<S, C> JsonFileStore<S, C>
where
    S: Snapshot,
    C: Clock + Send + Sync,
{
    /// Creates a store for `document` inside `dir`.
    #[must_use]
    pub fn new(dir: Arc<Dir>, document: impl Into<String>, clock: Arc<C>) -> Self {
        Self {
            dir,
            document: document.into(),
            clock,
            _snapshot: PhantomData,
        }
    }

    /// Returns the document file name.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    fn load(&self) -> StoreResult<S> {
        let raw = match self.dir.read_to_string(&self.document) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(S::default()),
            Err(err) => return Err(StoreError::io(self.document.as_str(), err)),
        };
        if raw.trim().is_empty() {
            return Ok(S::default());
        }
        serde_json::from_str(&raw).map_err(|err| StoreError::corrupt(self.document.as_str(), err))
    }

    fn persist(&self, snapshot: &S) -> StoreResult<()> {
        let mut value = serde_json::to_value(snapshot)
            .map_err(|err| StoreError::encode(self.document.as_str(), err))?;
        if let Value::Object(fields) = &mut value {
            fields.insert(
                "updated_at".to_owned(),
                Value::String(self.clock.utc().to_rfc3339()),
            );
        }
        let encoded = serde_json::to_string_pretty(&value)
            .map_err(|err| StoreError::encode(self.document.as_str(), err))?;

        let temp = format!("{}.tmp", self.document);
        self.dir
            .write(&temp, encoded)
            .map_err(|err| StoreError::io(temp.as_str(), err))?;
        self.dir
            .rename(&temp, &self.dir, &self.document)
            .map_err(|err| StoreError::io(self.document.as_str(), err))?;
        debug!(document = %self.document, "persisted snapshot");
        Ok(())
    }
}

impl<S, C> SnapshotStore<S> for JsonFileStore<S, C>
where
    S: Snapshot,
    C: Clock + Send + Sync,
{
    fn read(&self) -> StoreResult<S> {
        let _guard = DocumentGuard::acquire(&self.dir, &self.document, GuardMode::Shared)?;
        self.load()
    }

    fn update<R, F>(&self, mutate: F) -> StoreResult<R>
    where
        F: FnOnce(&mut S) -> R,
    {
        let _guard = DocumentGuard::acquire(&self.dir, &self.document, GuardMode::Exclusive)?;
        let mut snapshot = self.load()?;
        let before = snapshot.clone();
        let outcome = mutate(&mut snapshot);
        if snapshot != before {
            self.persist(&snapshot)?;
        }
        Ok(outcome)
    }
}
