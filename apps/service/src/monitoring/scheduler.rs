use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::executor::MonitoringExecutor;

/// Pause between successful rounds, bounds the probe rate against the target.
pub const DEFAULT_ROUND_DELAY: Duration = Duration::from_secs(5);

/// Cool-down after a round that could not be stored.
pub const DEFAULT_FAILURE_BACKOFF: Duration = Duration::from_secs(5);

/// Where the monitor loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum MonitorState {
    /// Between rounds (also before the first one)
    Waiting = 0,
    /// Ping process running
    Probing = 1,
    /// Appending the parsed record
    Recording = 2,
    /// Cooling down after a failed round
    Backoff = 3,
}

impl MonitorState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => MonitorState::Probing,
            2 => MonitorState::Recording,
            3 => MonitorState::Backoff,
            _ => MonitorState::Waiting,
        }
    }
}

/// Counters shared between the monitor loop and readers such as `/health`.
#[derive(Debug, Default)]
pub struct MonitorStats {
    rounds_completed: AtomicU64,
    rounds_failed: AtomicU64,
    state: AtomicU8,
}

impl MonitorStats {
    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed.load(Ordering::Relaxed)
    }

    pub fn rounds_failed(&self) -> u64 {
        self.rounds_failed.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> MonitorState {
        MonitorState::from_u8(self.state.load(Ordering::Relaxed))
    }

    pub(crate) fn set_state(&self, state: MonitorState) {
        let previous = self.state.swap(state as u8, Ordering::Relaxed);
        if previous != state as u8 {
            debug!("Monitor state: {:?} -> {:?}", MonitorState::from_u8(previous), state);
        }
    }

    fn record_success(&self) {
        self.rounds_completed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.rounds_failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Monitoring scheduler - runs rounds back to back for the life of the process
///
/// A round that fails is logged and retried after the backoff; nothing that
/// happens inside a round stops the loop.
pub struct MonitoringScheduler {
    executor: Arc<MonitoringExecutor>,
    round_delay: Duration,
    failure_backoff: Duration,
}

impl MonitoringScheduler {
    /// Create a new monitoring scheduler with the default delays
    pub fn new(executor: Arc<MonitoringExecutor>) -> Self {
        Self {
            executor,
            round_delay: DEFAULT_ROUND_DELAY,
            failure_backoff: DEFAULT_FAILURE_BACKOFF,
        }
    }

    pub fn with_delays(mut self, round_delay: Duration, failure_backoff: Duration) -> Self {
        self.round_delay = round_delay;
        self.failure_backoff = failure_backoff;
        self
    }

    pub fn stats(&self) -> Arc<MonitorStats> {
        self.executor.stats()
    }

    /// One round plus the pause that should follow it.
    async fn tick(&self) -> Duration {
        let stats = self.executor.stats();

        match self.executor.execute_round().await {
            Ok(_) => {
                stats.record_success();
                stats.set_state(MonitorState::Waiting);
                self.round_delay
            }
            Err(e) => {
                stats.record_failure();
                stats.set_state(MonitorState::Backoff);
                error!("Round failed, retrying in {:?}: {}", self.failure_backoff, e);
                self.failure_backoff
            }
        }
    }

    /// Run forever.
    pub async fn run(&self) {
        info!(
            "Starting continuous ping monitoring to {} with {} pings per round",
            self.executor.target(),
            self.executor.ping_count()
        );

        loop {
            let pause = self.tick().await;
            sleep(pause).await;
        }
    }

    /// Run on a background task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
