//! Error types shared by the namestamp crates

use std::io;
use std::path::PathBuf;

/// Result alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Please enter a name")]
    EmptyName,

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure reported by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Backend(String),
}
