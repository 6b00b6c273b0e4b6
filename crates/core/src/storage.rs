//! Storage seam used by the tracker and the rename flow
//!
//! Only two primitives are needed: an existence check and a rename.
//! `FsStorage` talks to the real file system; `MemoryStorage` keeps a set of
//! paths in memory and can be told to fail renames.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StorageError;

/// File-system primitives consumed by the engine
#[async_trait]
pub trait Storage: Send + Sync {
    /// Whether something exists at `path` right now
    ///
    /// Errors when the backend cannot tell, e.g. the parent directory is
    /// unreadable.
    async fn try_exists(&self, path: &Path) -> Result<bool, StorageError>;

    /// Like `try_exists`, counting an unanswerable check as absent
    async fn exists(&self, path: &Path) -> bool {
        match self.try_exists(path).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!("Existence check failed for {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Move `from` to `to`; never replaces an existing target
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError>;
}

/// Storage backed by the local file system
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn try_exists(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        if !self.exists(from).await {
            return Err(StorageError::NotFound(from.to_path_buf()));
        }
        if self.exists(to).await {
            return Err(StorageError::AlreadyExists(to.to_path_buf()));
        }

        tokio::fs::rename(from, to).await?;
        Ok(())
    }
}

/// In-memory storage holding a set of existing paths
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashSet<PathBuf>>,
    unreadable: Mutex<HashSet<PathBuf>>,
    rename_failure: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with the given paths
    pub fn with_files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let storage = Self::new();
        for path in paths {
            storage.insert(path);
        }
        storage
    }

    /// Make a file exist
    pub fn insert(&self, path: impl Into<PathBuf>) {
        self.files.lock().insert(path.into());
    }

    /// Make a file disappear, returning whether it existed
    pub fn remove(&self, path: &Path) -> bool {
        self.files.lock().remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.lock().contains(path)
    }

    /// Make existence checks for `path` fail until `make_readable`
    pub fn make_unreadable(&self, path: impl Into<PathBuf>) {
        self.unreadable.lock().insert(path.into());
    }

    pub fn make_readable(&self, path: &Path) {
        self.unreadable.lock().remove(path);
    }

    /// Fail every rename with `message` until cleared
    pub fn fail_renames(&self, message: impl Into<String>) {
        *self.rename_failure.lock() = Some(message.into());
    }

    pub fn clear_rename_failure(&self) {
        *self.rename_failure.lock() = None;
    }

    /// All existing paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.files.lock().iter().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn try_exists(&self, path: &Path) -> Result<bool, StorageError> {
        if self.unreadable.lock().contains(path) {
            return Err(StorageError::Backend(format!(
                "permission denied: {}",
                path.display()
            )));
        }
        Ok(self.contains(path))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        if let Some(message) = self.rename_failure.lock().clone() {
            return Err(StorageError::Backend(message));
        }

        let mut files = self.files.lock();
        if !files.contains(from) {
            return Err(StorageError::NotFound(from.to_path_buf()));
        }
        if files.contains(to) {
            return Err(StorageError::AlreadyExists(to.to_path_buf()));
        }

        files.remove(from);
        files.insert(to.to_path_buf());
        Ok(())
    }
}
