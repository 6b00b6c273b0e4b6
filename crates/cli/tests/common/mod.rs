//! Shared harness for orchestrator integration tests
//!
//! Runs a real `Orchestrator` loop and prompt worker against in-memory
//! storage. File-system events and reap ticks are injected by hand, and the
//! naming form plays back a script instead of reading the keyboard.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use cli_lib::{
    EngineEvent, FormAction, NameForm, Notifier, Orchestrator, PendingRename, PromptWorker,
};
use namestamp_core::{Clock, FileEntry, MemoryStorage, Stamper};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracker::EventFilter;
use watcher::{ReapTick, WatchEvent};

/// Timestamp produced by the harness clock (2024-06-15 19:30:22 UTC in Bogota)
pub const STAMP: &str = "20240615143022";

pub const DEBOUNCE: Duration = Duration::from_millis(20);

const WAIT: Duration = Duration::from_secs(5);

/// Directory every harness file lives in
pub fn vault(name: &str) -> PathBuf {
    PathBuf::from("/vault").join(name)
}

/// Instant the harness filter was activated
pub fn activation() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

/// Entry created after activation
pub fn fresh(name: &str) -> FileEntry {
    FileEntry::new(vault(name), activation() + Duration::from_secs(5))
}

/// Entry created before activation
pub fn stale(name: &str) -> FileEntry {
    FileEntry::new(vault(name), activation() - Duration::from_secs(5))
}

pub fn fixed_stamper() -> Stamper {
    let instant = Utc.with_ymd_and_hms(2024, 6, 15, 19, 30, 22).unwrap();
    Stamper::default().with_clock(Clock::Fixed(instant))
}

/// Records every notice shown
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notice(&self, message: &str) {
        self.notices.lock().push(message.to_string());
    }
}

/// Form that plays one script per prompt, in order
///
/// A prompt with no script left, or a script that runs out of actions, is
/// cancelled.
pub struct ScriptedForm {
    scripts: Arc<Mutex<VecDeque<Vec<FormAction>>>>,
    current: VecDeque<FormAction>,
    opened: Arc<Mutex<Vec<PathBuf>>>,
    previews: Arc<Mutex<Vec<String>>>,
}

impl ScriptedForm {
    /// Form playing `scripts`, plus a handle on the paths it was opened for
    pub fn new(scripts: Vec<Vec<FormAction>>) -> (Self, Arc<Mutex<Vec<PathBuf>>>) {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let form = Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
            current: VecDeque::new(),
            opened: opened.clone(),
            previews: Arc::new(Mutex::new(Vec::new())),
        };
        (form, opened)
    }
}

impl NameForm for ScriptedForm {
    fn open(&mut self, pending: &PendingRename, preview: &str) -> io::Result<()> {
        self.opened.lock().push(pending.entry.path.clone());
        self.previews.lock().push(preview.to_string());
        self.current = self.scripts.lock().pop_front().unwrap_or_default().into();
        Ok(())
    }

    fn render(&mut self, _input: &str, preview: &str) -> io::Result<()> {
        self.previews.lock().push(preview.to_string());
        Ok(())
    }

    fn next_action(&mut self) -> io::Result<FormAction> {
        Ok(self.current.pop_front().unwrap_or(FormAction::Cancel))
    }

    fn close(&mut self) -> io::Result<()> {
        self.current.clear();
        Ok(())
    }
}

/// Type `name` and confirm
pub fn name_it(name: &str) -> Vec<FormAction> {
    vec![FormAction::Edit(name.to_string()), FormAction::Confirm]
}

pub fn cancel() -> Vec<FormAction> {
    vec![FormAction::Cancel]
}

/// A running orchestrator with its prompt worker
pub struct Harness {
    pub storage: Arc<MemoryStorage>,
    pub notifier: RecordingNotifier,
    scripts: Arc<Mutex<VecDeque<Vec<FormAction>>>>,
    opened: Arc<Mutex<Vec<PathBuf>>>,
    previews: Arc<Mutex<Vec<String>>>,
    fs_tx: mpsc::UnboundedSender<WatchEvent>,
    reap_tx: mpsc::Sender<ReapTick>,
    events: broadcast::Receiver<EngineEvent>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Orchestrator>,
    _worker: thread::JoinHandle<()>,
}

impl Harness {
    pub fn start() -> Self {
        Self::with_storage(MemoryStorage::new())
    }

    pub fn with_storage(storage: MemoryStorage) -> Self {
        let storage = Arc::new(storage);
        let notifier = RecordingNotifier::default();
        let scripts = Arc::new(Mutex::new(VecDeque::new()));
        let opened = Arc::new(Mutex::new(Vec::new()));
        let previews = Arc::new(Mutex::new(Vec::new()));

        let (prompt_tx, prompt_rx) = crossbeam_channel::unbounded();
        let orchestrator = Orchestrator::new(
            EventFilter::new(activation()),
            storage.clone(),
            fixed_stamper(),
            DEBOUNCE,
            Arc::new(notifier.clone()),
            prompt_tx,
        );
        let events = orchestrator.subscribe();

        let form = ScriptedForm {
            scripts: scripts.clone(),
            current: VecDeque::new(),
            opened: opened.clone(),
            previews: previews.clone(),
        };
        let worker = PromptWorker::spawn(
            Box::new(form),
            Arc::new(notifier.clone()),
            prompt_rx,
            orchestrator.input_sender(),
        )
        .unwrap();

        let (fs_tx, fs_rx) = mpsc::unbounded_channel();
        let (reap_tx, reap_rx) = mpsc::channel(1);
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(orchestrator.run(fs_rx, reap_rx, async {
            let _ = shutdown_rx.await;
        }));

        Self {
            storage,
            notifier,
            scripts,
            opened,
            previews,
            fs_tx,
            reap_tx,
            events,
            shutdown,
            task,
            _worker: worker,
        }
    }

    /// Queue the script for the next prompt
    pub fn script(&self, actions: Vec<FormAction>) {
        self.scripts.lock().push_back(actions);
    }

    /// Make `entry` exist and report its creation
    pub fn create(&self, entry: FileEntry) {
        self.storage.insert(entry.path.clone());
        self.fs_tx.send(WatchEvent::Created(entry)).unwrap();
    }

    /// Report a creation without touching storage
    pub fn announce(&self, entry: FileEntry) {
        self.fs_tx.send(WatchEvent::Created(entry)).unwrap();
    }

    /// Remove `path` from storage and report the deletion
    pub fn delete(&self, path: &Path) {
        self.storage.remove(path);
        self.fs_tx.send(WatchEvent::Removed(path.to_path_buf())).unwrap();
    }

    /// Move a file in storage and report it the way the watcher does
    pub fn rename(&self, from: &Path, to: FileEntry) {
        self.storage.remove(from);
        self.storage.insert(to.path.clone());
        self.fs_tx
            .send(WatchEvent::Renamed {
                from: from.to_path_buf(),
                to,
            })
            .unwrap();
    }

    pub async fn reap(&self) {
        self.reap_tx.send(ReapTick).await.unwrap();
    }

    /// Next event matching `pred`, skipping the rest
    pub async fn wait_for<F>(&mut self, mut pred: F) -> EngineEvent
    where
        F: FnMut(&EngineEvent) -> bool,
    {
        let events = &mut self.events;
        tokio::time::timeout(WAIT, async move {
            loop {
                match events.recv().await {
                    Ok(event) if pred(&event) => return event,
                    Ok(_) => continue,
                    Err(e) => panic!("event stream broke: {e}"),
                }
            }
        })
        .await
        .expect("timed out waiting for engine event")
    }

    /// Collect events until `done` holds for everything seen so far
    pub async fn wait_until<F>(&mut self, mut done: F) -> Vec<EngineEvent>
    where
        F: FnMut(&[EngineEvent]) -> bool,
    {
        let mut seen = Vec::new();
        self.wait_for(|event| {
            seen.push(event.clone());
            done(&seen)
        })
        .await;
        seen
    }

    /// Path of the next accepted file
    pub async fn next_accepted(&mut self) -> PathBuf {
        match self
            .wait_for(|e| matches!(e, EngineEvent::Accepted(_)))
            .await
        {
            EngineEvent::Accepted(path) => path,
            other => unreachable!("{other:?}"),
        }
    }

    /// Paths the form was opened for, in order
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().clone()
    }

    /// Every preview the form displayed
    pub fn previews(&self) -> Vec<String> {
        self.previews.lock().clone()
    }

    /// Stop the loop and hand back the final orchestrator state
    pub async fn finish(self) -> Orchestrator {
        let _ = self.shutdown.send(());
        self.task.await.unwrap()
    }
}
