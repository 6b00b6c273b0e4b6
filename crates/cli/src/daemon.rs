//! Watch session lifecycle
//!
//! A `Session` is the process-scoped context: activation time, the empty
//! tracked set, the file-system subscription, the reaper and the prompt
//! worker. Everything it starts is released when it is dropped, whether the
//! session ended normally or with an error.

use anyhow::{Context, Result};
use namestamp_core::{FsStorage, Storage};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracker::EventFilter;
use tracing::info;
use watcher::{FsWatcher, IgnoreRules, PeriodicReaper, ReapTick, WatchEvent};

use crate::config::SystemConfig;
use crate::notice::Notifier;
use crate::orchestrator::{EngineEvent, EngineStats, Orchestrator};
use crate::prompt::{NameForm, PromptWorker};

/// Aborts a spawned task when dropped
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// What a finished session leaves behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub root: PathBuf,
    pub stats: EngineStats,
    /// Paths still tracked at shutdown
    pub tracked: Vec<PathBuf>,
}

/// Running watch session
pub struct Session {
    root: PathBuf,
    orchestrator: Orchestrator,
    fs_events: mpsc::UnboundedReceiver<WatchEvent>,
    reap_ticks: mpsc::Receiver<ReapTick>,
    _watcher: FsWatcher,
    _reaper: AbortOnDrop,
    _prompt_worker: thread::JoinHandle<()>,
}

impl Session {
    /// Start a session on `root` backed by the real file system
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        root: &Path,
        config: &SystemConfig,
        form: Box<dyn NameForm>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        Self::start_with_storage(root, config, Arc::new(FsStorage::new()), form, notifier)
    }

    /// Start a session with an explicit storage backend
    pub fn start_with_storage(
        root: &Path,
        config: &SystemConfig,
        storage: Arc<dyn Storage>,
        form: Box<dyn NameForm>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;

        // Files created before this instant are never prompted for
        let filter = EventFilter::starting_now();

        let (prompt_tx, prompt_rx) = crossbeam_channel::unbounded();
        let orchestrator = Orchestrator::new(
            filter,
            storage,
            config.stamper()?,
            config.debounce(),
            notifier.clone(),
            prompt_tx,
        );

        let prompt_worker =
            PromptWorker::spawn(form, notifier, prompt_rx, orchestrator.input_sender())
                .context("Failed to start prompt worker")?;

        let rules = IgnoreRules::load(root, config.ignore.clone())
            .context("Failed to load ignore rules")?;
        let (fs_tx, fs_events) = mpsc::unbounded_channel();
        let watcher = FsWatcher::start(root, rules, fs_tx)?;

        let (tick_tx, reap_ticks) = mpsc::channel(1);
        let reaper = PeriodicReaper::new(config.reap_interval(), tick_tx).spawn();

        info!(
            "Session started on {} (debounce {:?}, reap every {:?})",
            root.display(),
            config.debounce(),
            config.reap_interval()
        );

        Ok(Self {
            root: root.to_path_buf(),
            orchestrator,
            fs_events,
            reap_ticks,
            _watcher: watcher,
            _reaper: AbortOnDrop(reaper),
            _prompt_worker: prompt_worker,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subscribe to step outcomes
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.orchestrator.subscribe()
    }

    /// Process events until `shutdown` resolves, then tear everything down
    pub async fn run_until<F>(self, shutdown: F) -> SessionSummary
    where
        F: Future<Output = ()>,
    {
        let Session {
            root,
            orchestrator,
            fs_events,
            reap_ticks,
            _watcher: watcher,
            _reaper: reaper,
            _prompt_worker: _,
        } = self;

        let orchestrator = orchestrator.run(fs_events, reap_ticks, shutdown).await;

        // Unsubscribe and stop the reaper before reporting
        drop(watcher);
        drop(reaper);

        let summary = SessionSummary {
            root,
            stats: orchestrator.stats(),
            tracked: orchestrator.filter().tracked().snapshot(),
        };

        // Dropping the orchestrator closes the prompt queue and ends the worker
        drop(orchestrator);
        info!("Session on {} stopped", summary.root.display());
        summary
    }
}
