//! Port for checking which paths exist under the project root.

/// Read-only view of the project tree.
pub trait ProjectTree: Send + Sync {
    /// Returns whether the root-relative `path` exists. A trailing `/`
    /// names a directory and is ignored.
    fn exists(&self, path: &str) -> bool;
}
