//! Set of paths the engine currently owns

use ahash::AHashSet;
use std::path::{Path, PathBuf};

/// Paths already processed or in flight
///
/// Membership is the only state kept per path. Every operation is
/// idempotent: inserting twice keeps one entry, removing an absent path
/// is a no-op.
#[derive(Debug, Default)]
pub struct TrackedPaths {
    paths: AHashSet<PathBuf>,
}

impl TrackedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path, returning `false` if it was already tracked
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    /// Drop a path, returning whether it was tracked
    pub fn remove(&mut self, path: &Path) -> bool {
        self.paths.remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Move ownership from `old` to `new`
    pub fn replace(&mut self, old: &Path, new: impl Into<PathBuf>) {
        self.paths.remove(old);
        self.paths.insert(new.into());
    }

    /// Sorted copy of the current members
    pub fn snapshot(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.paths.iter().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}
