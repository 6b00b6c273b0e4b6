//! File system watching for namestamp
//!
//! This crate provides:
//! - A recursive watcher translating raw notify events into
//!   creations, deletions and renames of regular files
//! - Ignore rules for tool folders, temp files and user patterns
//! - The periodic reaper tick driving stale-path sweeps

pub mod ignore;
pub mod reaper;

use anyhow::{Context, Result};
use namestamp_core::{Error as CoreError, FileEntry};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use crate::ignore::{IgnoreConfig, IgnoreRules};
pub use crate::reaper::{PeriodicReaper, ReapTick};

/// File system event relevant to the rename engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A regular file appeared (created, or moved into the tree)
    Created(FileEntry),
    /// Something at this path went away (deleted, or moved out)
    Removed(PathBuf),
    /// A regular file moved within the tree
    Renamed { from: PathBuf, to: FileEntry },
}

impl WatchEvent {
    /// Path the event is about (the new path for renames)
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(entry) => &entry.path,
            WatchEvent::Removed(path) => path,
            WatchEvent::Renamed { to, .. } => &to.path,
        }
    }
}

/// Recursive subscription on a directory tree
///
/// Events are delivered on the channel given to `start`. Dropping the
/// watcher ends the subscription.
pub struct FsWatcher {
    root: PathBuf,
    _inner: RecommendedWatcher,
}

impl FsWatcher {
    /// Start watching `root` recursively
    pub fn start(
        root: &Path,
        rules: IgnoreRules,
        events: mpsc::UnboundedSender<WatchEvent>,
    ) -> Result<Self> {
        let mut translator = EventTranslator::new(rules);
        let mut inner = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for translated in translator.translate(&event) {
                    if events.send(translated).is_err() {
                        // Receiver gone: the session is shutting down
                        return;
                    }
                }
            }
            Err(e) => warn!("Watcher error: {}", e),
        })
        .context("Failed to create file watcher")?;

        inner
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;

        info!("Watching {}", root.display());

        Ok(Self {
            root: root.to_path_buf(),
            _inner: inner,
        })
    }

    /// Directory being watched
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for FsWatcher {
    fn drop(&mut self) {
        debug!("Stopped watching {}", self.root.display());
    }
}

/// Maps raw notify events to engine events
///
/// Backends that link rename halves with a tracker cookie (inotify) report
/// `From` and `To` separately and may follow up with a `Both`. The `From`
/// half is held back until its `To` arrives so the pair becomes a single
/// `Renamed`. A held `From` whose partner never shows up (moved out of the
/// tree) is released as `Removed` ahead of the next event.
pub struct EventTranslator {
    rules: IgnoreRules,
    /// Rename source waiting for its destination, by cookie
    pending_from: Option<(usize, PathBuf)>,
    /// Cookie of the last pair already reported
    last_paired: Option<usize>,
}

impl EventTranslator {
    pub fn new(rules: IgnoreRules) -> Self {
        Self {
            rules,
            pending_from: None,
            last_paired: None,
        }
    }

    /// Translate one raw event
    ///
    /// Directories, ignored paths and files that vanished before they could
    /// be inspected produce nothing.
    pub fn translate(&mut self, event: &Event) -> Vec<WatchEvent> {
        let mut out = Vec::new();
        let tracker = event.tracker();

        match (&event.kind, tracker) {
            (EventKind::Modify(ModifyKind::Name(RenameMode::From)), Some(cookie)) => {
                self.flush_into(&mut out);
                if let Some(path) = event.paths.first() {
                    self.pending_from = Some((cookie, path.clone()));
                }
                return out;
            }
            (EventKind::Modify(ModifyKind::Name(RenameMode::To)), Some(cookie)) => {
                if let Some(from) = self.take_pending(cookie) {
                    if let Some(to) = event.paths.first() {
                        self.last_paired = Some(cookie);
                        self.push_renamed(&mut out, &from, to);
                        return out;
                    }
                    self.push_removed(&mut out, &from);
                }
            }
            (EventKind::Modify(ModifyKind::Name(RenameMode::Both)), Some(cookie)) => {
                if self.last_paired == Some(cookie) {
                    // Already reported from the To half
                    return out;
                }
                // Reported below as one rename
                let _ = self.take_pending(cookie);
            }
            _ => {}
        }

        self.flush_into(&mut out);

        match event.kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                for path in &event.paths {
                    self.push_created(&mut out, path);
                }
            }
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                for path in &event.paths {
                    self.push_removed(&mut out, path);
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let [from, to] = event.paths.as_slice() {
                    self.push_renamed(&mut out, from, to);
                }
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                // Backends that cannot pair rename halves report each path alone
                for path in &event.paths {
                    if path.exists() {
                        self.push_created(&mut out, path);
                    } else {
                        self.push_removed(&mut out, path);
                    }
                }
            }
            _ => {}
        }

        out
    }

    /// Release a held rename source as a removal
    pub fn flush(&mut self) -> Vec<WatchEvent> {
        let mut out = Vec::new();
        self.flush_into(&mut out);
        out
    }

    fn flush_into(&mut self, out: &mut Vec<WatchEvent>) {
        if let Some((_, from)) = self.pending_from.take() {
            self.push_removed(out, &from);
        }
    }

    fn take_pending(&mut self, cookie: usize) -> Option<PathBuf> {
        match self.pending_from.take() {
            Some((pending, from)) if pending == cookie => Some(from),
            other => {
                self.pending_from = other;
                None
            }
        }
    }

    fn push_renamed(&self, out: &mut Vec<WatchEvent>, from: &Path, to: &Path) {
        if self.rules.should_ignore(from) {
            self.push_created(out, to);
            return;
        }
        if self.rules.should_ignore(to) {
            self.push_removed(out, from);
            return;
        }

        match FileEntry::from_path(to) {
            Ok(entry) => out.push(WatchEvent::Renamed {
                from: from.to_path_buf(),
                to: entry,
            }),
            Err(e) => {
                if !matches!(e, CoreError::NotAFile(_)) {
                    debug!("Rename target unreadable: {}", e);
                }
                out.push(WatchEvent::Removed(from.to_path_buf()));
            }
        }
    }

    fn push_created(&self, out: &mut Vec<WatchEvent>, path: &Path) {
        if self.rules.should_ignore(path) {
            return;
        }

        match FileEntry::from_path(path) {
            Ok(entry) => out.push(WatchEvent::Created(entry)),
            Err(CoreError::NotAFile(_)) => {}
            Err(e) => debug!("Skipping creation event: {}", e),
        }
    }

    fn push_removed(&self, out: &mut Vec<WatchEvent>, path: &Path) {
        if self.rules.should_ignore(path) {
            return;
        }
        out.push(WatchEvent::Removed(path.to_path_buf()));
    }
}
