//! Core building blocks for namestamp
//!
//! This crate provides:
//! - File handles for watched files (`FileEntry`)
//! - Category classification from name and extension
//! - Timezone-pinned, digits-only timestamps
//! - The naming session behind the rename prompt
//! - The storage seam (real file system and in-memory)

pub mod category;
pub mod entry;
pub mod error;
pub mod naming;
pub mod stamp;
pub mod storage;

// Re-exports
pub use category::{classify, Category};
pub use entry::FileEntry;
pub use error::{Error, Result, StorageError};
pub use naming::{compose_name, NamingSession, PLACEHOLDER_NAME};
pub use stamp::{Clock, Stamper, DEFAULT_TIMEZONE};
pub use storage::{FsStorage, MemoryStorage, Storage};
