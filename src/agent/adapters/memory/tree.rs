//! In-memory project tree.

use crate::agent::ports::ProjectTree;
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

/// Set of file paths; every parent directory of a stored path exists too.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectTree {
    paths: Arc<RwLock<BTreeSet<String>>>,
}

impl InMemoryProjectTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree holding `paths`.
    #[must_use]
    pub fn with_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let tree = Self::new();
        for path in paths {
            tree.insert(path);
        }
        tree
    }

    /// Adds a file path.
    pub fn insert(&self, path: impl Into<String>) {
        self.paths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
    }
}

impl ProjectTree for InMemoryProjectTree {
    fn exists(&self, path: &str) -> bool {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return false;
        }
        let directory = format!("{trimmed}/");
        self.paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|stored| stored == trimmed || stored.starts_with(&directory))
    }
}
