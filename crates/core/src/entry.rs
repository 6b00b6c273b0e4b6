//! File handles for watched files

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::category::{classify, Category};
use crate::error::{Error, Result};

/// A regular file reported by the watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Full path
    pub path: PathBuf,
    /// Final path component
    pub name: String,
    /// Text after the last dot of the name (empty when there is none)
    pub extension: String,
    /// Birth time, or modification time where the platform has no birth time
    pub created: SystemTime,
}

impl FileEntry {
    /// Build an entry from a path and a known creation time
    pub fn new(path: impl Into<PathBuf>, created: SystemTime) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path,
            name,
            extension,
            created,
        }
    }

    /// Stat a path on disk and build its entry
    ///
    /// Fails for directories and for paths that no longer exist.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|source| Error::Metadata {
            path: path.to_path_buf(),
            source,
        })?;

        if !metadata.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }

        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|source| Error::Metadata {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::new(path, created))
    }

    /// Directory containing the file
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Category tag for this file
    pub fn category(&self) -> Category {
        classify(&self.name, &self.extension)
    }

    /// File name for `stem` with this entry's extension appended
    pub fn file_name_with(&self, stem: &str) -> String {
        if self.extension.is_empty() {
            stem.to_string()
        } else {
            format!("{}.{}", stem, self.extension)
        }
    }

    /// Sibling path named `stem` with this entry's extension
    pub fn sibling_with(&self, stem: &str) -> PathBuf {
        self.parent().join(self.file_name_with(stem))
    }
}
