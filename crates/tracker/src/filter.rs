//! Event filter and dedup tracker
//!
//! Decides whether a creation event is a genuine new user file. A file is
//! rejected when:
//! 1. It is the markdown companion of a drawing that is already tracked
//!    (or a drawing whose companion is already tracked)
//! 2. Its path is already tracked
//! 3. Its name carries a capture-tool timestamp (`2024-01-01 12.00.00`)
//! 4. It was created before the session started
//!
//! Acceptance does not track the path. Tracking happens in `claim`, once the
//! debounce window has passed and the file is confirmed to still exist.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

use namestamp_core::category::NOTE_EXTENSION;
use namestamp_core::{FileEntry, Storage};
use regex::Regex;
use tracing::{debug, warn};

use crate::tracked::TrackedPaths;

/// Names produced by screenshot/recording tools rather than by the user
static CAPTURE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}\.\d{2}\.\d{2}").expect("capture pattern is valid")
});

const DRAWING_SUFFIX: &str = ".excalidraw";
const COMPANION_SUFFIX: &str = ".excalidraw.md";

/// Why a creation event was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The other half of a drawing/companion pair is already tracked
    Companion,
    /// The path is already owned
    AlreadyTracked,
    /// Name matches the capture-tool timestamp pattern
    CaptureArtifact,
    /// Created before the session started
    PredatesActivation,
}

/// Outcome of the acceptance check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Outcome of claiming a path after the debounce window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The path is now tracked and owned by the caller
    Claimed,
    /// Another flow claimed the same path first
    AlreadyTracked,
    /// The other half of the companion pair was claimed first
    Companion,
}

/// Filter plus the tracked-path set it guards
#[derive(Debug)]
pub struct EventFilter {
    tracked: TrackedPaths,
    activation: SystemTime,
}

impl EventFilter {
    /// Create a filter ignoring files created before `activation`
    pub fn new(activation: SystemTime) -> Self {
        Self {
            tracked: TrackedPaths::new(),
            activation,
        }
    }

    /// Create a filter whose activation time is now
    pub fn starting_now() -> Self {
        Self::new(SystemTime::now())
    }

    pub fn activation(&self) -> SystemTime {
        self.activation
    }

    pub fn tracked(&self) -> &TrackedPaths {
        &self.tracked
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.tracked.contains(path)
    }

    /// Classify a creation event without touching the tracked set
    pub fn verdict(&self, entry: &FileEntry) -> Verdict {
        if self.companion_tracked(entry) {
            return Verdict::Reject(RejectReason::Companion);
        }

        if self.tracked.contains(&entry.path) {
            return Verdict::Reject(RejectReason::AlreadyTracked);
        }

        if CAPTURE_NAME.is_match(&entry.name) {
            return Verdict::Reject(RejectReason::CaptureArtifact);
        }

        if entry.created < self.activation {
            return Verdict::Reject(RejectReason::PredatesActivation);
        }

        Verdict::Accept
    }

    /// Whether a creation event should start the rename flow
    pub fn should_process(&self, entry: &FileEntry) -> bool {
        match self.verdict(entry) {
            Verdict::Accept => true,
            Verdict::Reject(reason) => {
                debug!("Ignoring {} ({:?})", entry.path.display(), reason);
                false
            }
        }
    }

    /// Take ownership of a path that survived the debounce window
    ///
    /// Re-checks duplicates and companions, then inserts. Nothing can run
    /// between the check and the insert.
    pub fn claim(&mut self, entry: &FileEntry) -> Claim {
        if self.companion_tracked(entry) {
            return Claim::Companion;
        }
        if !self.tracked.insert(entry.path.clone()) {
            return Claim::AlreadyTracked;
        }
        Claim::Claimed
    }

    /// Forget a deleted path so a later file at the same path counts as new
    pub fn mark_deletion(&mut self, path: &Path) -> bool {
        let removed = self.tracked.remove(path);
        if removed {
            debug!("Untracked deleted file {}", path.display());
        }
        removed
    }

    /// Move ownership to the renamed path
    pub fn record_rename(&mut self, old: &Path, new: &Path) {
        self.tracked.replace(old, new);
    }

    /// Drop tracked paths whose file no longer exists
    ///
    /// Works on a snapshot taken at the start of the sweep and returns the
    /// number of paths removed. Only confirmed absence evicts; a path whose
    /// existence check fails stays tracked until a later sweep can tell.
    pub async fn reap<S>(&mut self, storage: &S) -> usize
    where
        S: Storage + ?Sized,
    {
        let mut removed = 0;

        for path in self.tracked.snapshot() {
            match storage.try_exists(&path).await {
                Ok(true) => {}
                Ok(false) => {
                    if self.tracked.remove(&path) {
                        debug!("Reaped stale path {}", path.display());
                        removed += 1;
                    }
                }
                Err(e) => warn!("Keeping {} tracked, existence unknown: {}", path.display(), e),
            }
        }

        removed
    }

    /// Forget everything (session teardown)
    pub fn clear(&mut self) {
        self.tracked.clear();
    }

    fn companion_tracked(&self, entry: &FileEntry) -> bool {
        companion_of(entry).is_some_and(|other| self.tracked.contains(&other))
    }
}

/// Path of the other half of a drawing/companion pair, if `entry` is one
///
/// `x.excalidraw.md` pairs with `x.excalidraw`, and `x.excalidraw` with
/// `x.excalidraw.md`, both in the same directory.
pub fn companion_of(entry: &FileEntry) -> Option<PathBuf> {
    if entry.extension == NOTE_EXTENSION && entry.name.ends_with(COMPANION_SUFFIX) {
        let base = entry.name.strip_suffix(".md")?;
        return Some(entry.parent().join(base));
    }

    if entry.name.ends_with(DRAWING_SUFFIX) {
        return Some(entry.parent().join(format!("{}.{}", entry.name, NOTE_EXTENSION)));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use namestamp_core::MemoryStorage;
    use std::time::Duration;

    fn filter() -> (EventFilter, SystemTime) {
        let activation = SystemTime::now();
        (EventFilter::new(activation), activation)
    }

    fn fresh(path: &str, activation: SystemTime) -> FileEntry {
        FileEntry::new(path, activation + Duration::from_secs(1))
    }

    #[test]
    fn test_accepts_new_file() {
        let (filter, t0) = filter();
        assert!(filter.should_process(&fresh("/v/shot.png", t0)));
    }

    #[test]
    fn test_accept_check_is_idempotent_until_claimed() {
        let (mut filter, t0) = filter();
        let entry = fresh("/v/todo.md", t0);

        assert!(filter.should_process(&entry));
        assert!(filter.should_process(&entry));
        assert!(!filter.is_tracked(&entry.path));

        assert_eq!(filter.claim(&entry), Claim::Claimed);
        assert_eq!(
            filter.verdict(&entry),
            Verdict::Reject(RejectReason::AlreadyTracked)
        );
    }

    #[test]
    fn test_rejects_capture_tool_names() {
        let (filter, t0) = filter();
        let entry = fresh("/v/2024-01-01 12.00.00.png", t0);
        assert_eq!(
            filter.verdict(&entry),
            Verdict::Reject(RejectReason::CaptureArtifact)
        );

        let embedded = fresh("/v/Screenshot 2024-01-01 12.00.00 copy.png", t0);
        assert!(!filter.should_process(&embedded));

        let near_miss = fresh("/v/2024-01-01 12-00-00.png", t0);
        assert!(filter.should_process(&near_miss));
    }

    #[test]
    fn test_rejects_files_older_than_activation() {
        let (filter, t0) = filter();
        let entry = FileEntry::new("/v/note.md", t0 - Duration::from_secs(60));
        assert_eq!(
            filter.verdict(&entry),
            Verdict::Reject(RejectReason::PredatesActivation)
        );

        let same_instant = FileEntry::new("/v/note.md", t0);
        assert!(filter.should_process(&same_instant));
    }

    #[test]
    fn test_companion_defers_to_tracked_drawing() {
        let (mut filter, t0) = filter();
        let drawing = fresh("/v/art/drawing.excalidraw", t0);
        let companion = fresh("/v/art/drawing.excalidraw.md", t0);

        assert_eq!(filter.claim(&drawing), Claim::Claimed);
        assert_eq!(
            filter.verdict(&companion),
            Verdict::Reject(RejectReason::Companion)
        );
        assert_eq!(filter.claim(&companion), Claim::Companion);

        // Same name in another directory is unrelated
        let elsewhere = fresh("/v/other/drawing.excalidraw.md", t0);
        assert!(filter.should_process(&elsewhere));
    }

    #[test]
    fn test_drawing_defers_to_tracked_companion() {
        let (mut filter, t0) = filter();
        let companion = fresh("/v/drawing.excalidraw.md", t0);
        let drawing = fresh("/v/drawing.excalidraw", t0);

        assert_eq!(filter.claim(&companion), Claim::Claimed);
        assert_eq!(
            filter.verdict(&drawing),
            Verdict::Reject(RejectReason::Companion)
        );
    }

    #[test]
    fn test_companion_of() {
        let t0 = SystemTime::now();
        assert_eq!(
            companion_of(&fresh("/v/a.excalidraw.md", t0)),
            Some(PathBuf::from("/v/a.excalidraw"))
        );
        assert_eq!(
            companion_of(&fresh("/v/a.excalidraw", t0)),
            Some(PathBuf::from("/v/a.excalidraw.md"))
        );
        assert_eq!(companion_of(&fresh("/v/a.md", t0)), None);
        assert_eq!(companion_of(&fresh("/v/a.png", t0)), None);
    }

    #[test]
    fn test_deletion_untracks_and_allows_recreation() {
        let (mut filter, t0) = filter();
        let entry = fresh("/v/a.md", t0);
        filter.claim(&entry);

        assert!(filter.mark_deletion(&entry.path));
        assert!(!filter.mark_deletion(&entry.path));
        assert!(filter.should_process(&entry));
    }

    #[test]
    fn test_deletion_of_untracked_path_is_noop() {
        let (mut filter, _) = filter();
        assert!(!filter.mark_deletion(Path::new("/v/never-seen.md")));
        assert!(filter.tracked().is_empty());
    }

    #[test]
    fn test_record_rename() {
        let (mut filter, t0) = filter();
        let entry = fresh("/v/shot.png", t0);
        filter.claim(&entry);

        let target = PathBuf::from("/v/vacation-20240615143022-image.png");
        filter.record_rename(&entry.path, &target);

        assert!(!filter.is_tracked(&entry.path));
        assert!(filter.is_tracked(&target));
    }

    #[tokio::test]
    async fn test_reap_drops_only_missing_paths() {
        let (mut filter, t0) = filter();
        let kept = fresh("/v/kept.md", t0);
        let gone = fresh("/v/gone.md", t0);
        filter.claim(&kept);
        filter.claim(&gone);

        let storage = MemoryStorage::with_files(["/v/kept.md"]);
        assert_eq!(filter.reap(&storage).await, 1);

        assert!(filter.is_tracked(&kept.path));
        assert!(!filter.is_tracked(&gone.path));

        // Nothing left to reap
        assert_eq!(filter.reap(&storage).await, 0);
        assert_eq!(filter.tracked().len(), 1);
    }

    #[tokio::test]
    async fn test_reap_keeps_paths_it_cannot_check() {
        let (mut filter, t0) = filter();
        let locked = fresh("/v/locked/memo.m4a", t0);
        filter.claim(&locked);

        let storage = MemoryStorage::with_files(["/v/locked/memo.m4a"]);
        storage.make_unreadable("/v/locked/memo.m4a");
        assert_eq!(filter.reap(&storage).await, 0);
        assert!(filter.is_tracked(&locked.path));

        // Once the check answers, a missing file is reaped as usual
        storage.make_readable(&locked.path);
        storage.remove(&locked.path);
        assert_eq!(filter.reap(&storage).await, 1);
        assert!(filter.tracked().is_empty());
    }
}
