//! Rename orchestrator
//!
//! Drives each accepted file through
//! `Accepted -> Debouncing -> Validating -> AwaitingInput -> Renaming`.
//!
//! The orchestrator is the only owner of the tracked set. It runs as one
//! loop that handles a single input to completion before looking at the
//! next one; debounce timers and the prompt worker only post messages back
//! into that loop. This makes the Validating check-then-claim atomic without
//! any locking.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender as PromptSender;
use namestamp_core::{Category, FileEntry, NamingSession, Stamper, Storage};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracker::{Claim, EventFilter};
use tracing::{debug, info, warn};
use watcher::{ReapTick, WatchEvent};

use crate::notice::Notifier;

/// Default settle time between a creation event and the prompt
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

const EVENT_CAPACITY: usize = 256;

/// A file waiting for its new name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRename {
    /// The file as it was when the debounce fired
    pub entry: FileEntry,
    /// Timestamp baked into the new name
    pub timestamp: String,
    /// Category tag baked into the new name
    pub category: Category,
}

impl PendingRename {
    pub fn new(entry: FileEntry, timestamp: String) -> Self {
        let category = entry.category();
        Self {
            entry,
            timestamp,
            category,
        }
    }

    /// Fresh input state for the naming form
    pub fn session(&self) -> NamingSession {
        NamingSession::new(self.timestamp.clone(), self.category)
    }
}

/// How the naming form was closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Operator confirmed; carries the full new stem
    Confirmed(String),
    /// Operator dismissed the form
    Cancelled,
}

/// One unit of work for the loop
#[derive(Debug)]
pub enum Input {
    /// Raw creation, deletion or rename from the watcher
    Fs(WatchEvent),
    /// Debounce window of an accepted file elapsed
    Fired(FileEntry),
    /// Naming form closed
    Answered {
        pending: PendingRename,
        outcome: PromptOutcome,
    },
    /// Sweep the tracked set
    Reap,
}

/// Observable outcome of a step, broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Passed the filter; debounce started
    Accepted(PathBuf),
    /// Gone before the debounce fired
    Vanished(PathBuf),
    /// Lost the claim to an earlier event for the same file or its companion
    Duplicate(PathBuf),
    /// Queued for the naming form
    Prompted(PathBuf),
    /// Form dismissed; file keeps its name
    Cancelled(PathBuf),
    /// Renamed successfully
    Renamed { from: PathBuf, to: PathBuf },
    /// Target name already taken
    Collision { path: PathBuf, target: PathBuf },
    /// A tracked file was renamed outside the engine; tracking follows it
    Moved { from: PathBuf, to: PathBuf },
    /// A tracked file was deleted and is no longer tracked
    Forgotten(PathBuf),
    /// Storage refused the rename
    Failed { path: PathBuf, error: String },
    /// Sweep finished, with the number of paths dropped
    Reaped(usize),
}

/// Counters over a session
///
/// Counts flows, not raw events: duplicate creation events for one file
/// show up in `duplicates`, never in `prompted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Flows that claimed their file and reached the naming form
    pub prompted: usize,
    pub renamed: usize,
    pub cancelled: usize,
    pub collisions: usize,
    pub failures: usize,
    /// Flows that lost the claim to an earlier event for the same file
    pub duplicates: usize,
    /// Flows whose file disappeared during the debounce
    pub vanished: usize,
    /// Tracked files followed through an outside rename
    pub moved: usize,
    pub reaped: usize,
}

impl EngineStats {
    fn record(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Prompted(_) => self.prompted += 1,
            EngineEvent::Renamed { .. } => self.renamed += 1,
            EngineEvent::Cancelled(_) => self.cancelled += 1,
            EngineEvent::Collision { .. } => self.collisions += 1,
            EngineEvent::Failed { .. } => self.failures += 1,
            EngineEvent::Duplicate(_) => self.duplicates += 1,
            EngineEvent::Vanished(_) => self.vanished += 1,
            EngineEvent::Moved { .. } => self.moved += 1,
            EngineEvent::Reaped(n) => self.reaped += n,
            EngineEvent::Accepted(_) | EngineEvent::Forgotten(_) => {}
        }
    }
}

/// Event filter plus the rename state machine around it
pub struct Orchestrator {
    filter: EventFilter,
    storage: Arc<dyn Storage>,
    stamper: Stamper,
    debounce: Duration,
    notifier: Arc<dyn Notifier>,
    prompts: PromptSender<PendingRename>,
    inbox_tx: mpsc::UnboundedSender<Input>,
    inbox_rx: mpsc::UnboundedReceiver<Input>,
    timers: JoinSet<()>,
    events: broadcast::Sender<EngineEvent>,
    stats: EngineStats,
}

impl Orchestrator {
    /// Create an orchestrator that hands prompts to `prompts`
    pub fn new(
        filter: EventFilter,
        storage: Arc<dyn Storage>,
        stamper: Stamper,
        debounce: Duration,
        notifier: Arc<dyn Notifier>,
        prompts: PromptSender<PendingRename>,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            filter,
            storage,
            stamper,
            debounce,
            notifier,
            prompts,
            inbox_tx,
            inbox_rx,
            timers: JoinSet::new(),
            events,
            stats: EngineStats::default(),
        }
    }

    /// Sender for answers and other inputs posted back into the loop
    pub fn input_sender(&self) -> mpsc::UnboundedSender<Input> {
        self.inbox_tx.clone()
    }

    /// Subscribe to step outcomes
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Run until `shutdown` resolves or every input source is closed
    ///
    /// Returns the orchestrator so callers can inspect the final state.
    pub async fn run<F>(
        mut self,
        mut fs_events: mpsc::UnboundedReceiver<WatchEvent>,
        mut reap_ticks: mpsc::Receiver<ReapTick>,
        shutdown: F,
    ) -> Self
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let input = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                Some(input) = self.inbox_rx.recv() => input,
                Some(event) = fs_events.recv() => Input::Fs(event),
                Some(ReapTick) = reap_ticks.recv() => Input::Reap,
                Some(_) = self.timers.join_next(), if !self.timers.is_empty() => continue,
                else => break,
            };

            self.handle(input).await;
        }

        self.timers.abort_all();
        info!("Orchestrator stopped ({} tracked)", self.filter.tracked().len());
        self
    }

    /// Process one input to completion
    pub async fn handle(&mut self, input: Input) {
        match input {
            Input::Fs(WatchEvent::Created(entry)) => self.on_created(entry),
            Input::Fs(WatchEvent::Removed(path)) => {
                if self.filter.mark_deletion(&path) {
                    self.emit(EngineEvent::Forgotten(path));
                }
            }
            Input::Fs(WatchEvent::Renamed { from, to }) => self.on_moved(from, to),
            Input::Fired(entry) => self.on_fired(entry).await,
            Input::Answered { pending, outcome } => self.on_answered(pending, outcome).await,
            Input::Reap => {
                let removed = self.filter.reap(&*self.storage).await;
                if removed > 0 {
                    info!("Reaped {} stale tracked paths", removed);
                }
                self.emit(EngineEvent::Reaped(removed));
            }
        }
    }

    /// Accepted: start the debounce window without tracking the path
    fn on_created(&mut self, entry: FileEntry) {
        if !self.filter.should_process(&entry) {
            return;
        }

        debug!("Accepted {}, settling for {:?}", entry.path.display(), self.debounce);
        self.emit(EngineEvent::Accepted(entry.path.clone()));

        let inbox = self.inbox_tx.clone();
        let delay = self.debounce;
        self.timers.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = inbox.send(Input::Fired(entry));
        });
    }

    /// Rename seen by the watcher: follow tracked files, treat the rest as new
    ///
    /// Renames done by the engine itself land here too; their source is no
    /// longer tracked and the target is, so the filter drops them.
    fn on_moved(&mut self, from: PathBuf, to: FileEntry) {
        if !self.filter.is_tracked(&from) {
            self.on_created(to);
            return;
        }

        debug!("Tracked {} moved to {}", from.display(), to.path.display());
        self.filter.record_rename(&from, &to.path);
        self.emit(EngineEvent::Moved { from, to: to.path });
    }

    /// Validating: re-check existence, claim, then queue the prompt
    async fn on_fired(&mut self, entry: FileEntry) {
        if !self.storage.exists(&entry.path).await {
            debug!("{} vanished before the debounce fired", entry.path.display());
            self.emit(EngineEvent::Vanished(entry.path));
            return;
        }

        match self.filter.claim(&entry) {
            Claim::Claimed => {}
            Claim::AlreadyTracked | Claim::Companion => {
                debug!("{} already claimed", entry.path.display());
                self.emit(EngineEvent::Duplicate(entry.path));
                return;
            }
        }

        let pending = PendingRename::new(entry, self.stamper.stamp());
        let path = pending.entry.path.clone();

        info!("Prompting for a name for {}", path.display());
        if self.prompts.send(pending).is_err() {
            warn!("Prompt worker is gone, {} keeps its name", path.display());
            return;
        }
        self.emit(EngineEvent::Prompted(path));
    }

    /// Renaming: collision check, rename, swap tracked membership
    async fn on_answered(&mut self, pending: PendingRename, outcome: PromptOutcome) {
        let entry = pending.entry;

        let stem = match outcome {
            PromptOutcome::Confirmed(stem) => stem,
            PromptOutcome::Cancelled => {
                info!("Rename of {} cancelled", entry.path.display());
                self.emit(EngineEvent::Cancelled(entry.path));
                return;
            }
        };

        let file_name = entry.file_name_with(&stem);
        let target = entry.parent().join(&file_name);

        if self.storage.exists(&target).await {
            self.notifier
                .notice(&format!("File {} already exists", file_name));
            self.emit(EngineEvent::Collision {
                path: entry.path,
                target,
            });
            return;
        }

        match self.storage.rename(&entry.path, &target).await {
            Ok(()) => {
                self.filter.record_rename(&entry.path, &target);
                info!("Renamed {} to {}", entry.path.display(), target.display());
                self.notifier.notice(&format!("Renamed to {}", file_name));
                self.emit(EngineEvent::Renamed {
                    from: entry.path,
                    to: target,
                });
            }
            Err(e) => {
                warn!("Failed to rename {}: {}", entry.path.display(), e);
                self.notifier
                    .notice(&format!("Error renaming file: {}", e));
                self.emit(EngineEvent::Failed {
                    path: entry.path,
                    error: e.to_string(),
                });
            }
        }
    }

    fn emit(&mut self, event: EngineEvent) {
        self.stats.record(&event);
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
