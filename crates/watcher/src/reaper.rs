//! Periodic reaper tick
//!
//! Tracked paths can leak when files disappear outside the normal event
//! flow (missed deletion events, moves out of the tree). The reaper wakes on
//! a fixed interval and asks the engine loop to sweep; the sweep itself runs
//! on the loop, which owns the tracked set.

use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Default sweep interval
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(10);

/// Request for one sweep of the tracked set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReapTick;

/// Fixed-interval scheduler for tracked-set sweeps
pub struct PeriodicReaper {
    /// Time between sweeps
    interval: Duration,

    /// Sender for sweep requests
    tick_tx: mpsc::Sender<ReapTick>,
}

impl PeriodicReaper {
    /// Create new periodic reaper
    ///
    /// A tick is dropped when the previous one has not been consumed yet,
    /// so a bounded channel of capacity 1 coalesces overdue sweeps.
    pub fn new(interval: Duration, tick_tx: mpsc::Sender<ReapTick>) -> Self {
        Self { interval, tick_tx }
    }

    /// Spawn the loop on the current runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until the receiving side goes away
    ///
    /// The first tick fires one full interval after start.
    pub async fn run(self) {
        let mut timer = interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Starting periodic reaper (interval: {:?})", self.interval);

        loop {
            timer.tick().await;

            match self.tick_tx.try_send(ReapTick) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    debug!("Previous reap still pending, skipping tick");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Reaper receiver closed, stopping");
                    break;
                }
            }
        }
    }
}
