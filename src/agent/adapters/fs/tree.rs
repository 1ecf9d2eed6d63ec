//! Project tree backed by a directory capability on the project root.

use crate::agent::ports::ProjectTree;
use cap_std::fs_utf8::Dir;
use std::sync::Arc;

/// Answers existence checks against the real project root.
#[derive(Debug, Clone)]
pub struct FsProjectTree {
    root: Arc<Dir>,
}

impl FsProjectTree {
    /// Creates a tree over an open project root.
    #[must_use]
    pub const fn new(root: Arc<Dir>) -> Self {
        Self { root }
    }
}

impl ProjectTree for FsProjectTree {
    fn exists(&self, path: &str) -> bool {
        let trimmed = path.trim_end_matches('/');
        !trimmed.is_empty() && self.root.exists(trimmed)
    }
}
