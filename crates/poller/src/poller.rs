//! Repeating fetch cycle.
//!
//! Every issued fetch carries a generation number. A completion is applied
//! only when its generation is still the newest one issued, so a slow
//! response can never overwrite a fresher one.
//!
//! Two locks are involved. `progress` guards the state and is held only to
//! apply a result. The callback lock is held for the whole completion,
//! including the `on_update` call, and [`PollHandle::stop`] takes it after
//! marking the poller stopped, so no callback runs once `stop` has returned.
//! It is re-entrant, which lets `on_update` call back into its handle.

use blockview_config::PollerConfig;
use blockview_snapshot::Snapshot;
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{PollError, PollResult};
use crate::source::{HttpSnapshotSource, SnapshotSource};
use crate::state::PollState;

/// Shortest accepted polling interval.
const MIN_INTERVAL: Duration = Duration::from_millis(10);

type UpdateCallback = Box<dyn FnMut(&PollState) + Send>;

#[derive(Default)]
struct Progress {
    state: PollState,
    issued: u64,
    stopped: bool,
}

impl Progress {
    /// Marks a new fetch as in flight and returns its generation.
    fn begin(&mut self) -> Option<u64> {
        if self.stopped {
            return None;
        }
        self.issued += 1;
        self.state.begin_fetch();
        Some(self.issued)
    }

    /// Applies a result and returns the state to deliver, if any.
    fn apply(&mut self, generation: u64, result: PollResult<Snapshot>) -> Option<PollState> {
        if self.stopped {
            debug!(target: "blockview", generation, "poller stopped, dropping result");
            return None;
        }
        if generation != self.issued {
            debug!(
                target: "blockview",
                generation,
                latest = self.issued,
                "superseded fetch result discarded"
            );
            return None;
        }

        match result {
            Ok(snapshot) => self.state.apply_success(snapshot),
            Err(err) => {
                warn!(target: "blockview", generation, error = %err, "snapshot refresh failed");
                self.state.apply_failure(err);
            }
        }
        Some(self.state.clone())
    }
}

struct Shared {
    progress: Mutex<Progress>,
    on_update: ReentrantMutex<RefCell<UpdateCallback>>,
}

impl Shared {
    fn new(on_update: UpdateCallback) -> Self {
        Self {
            progress: Mutex::new(Progress::default()),
            on_update: ReentrantMutex::new(RefCell::new(on_update)),
        }
    }

    fn begin(&self) -> Option<u64> {
        self.progress.lock().begin()
    }

    fn complete(&self, generation: u64, result: PollResult<Snapshot>) {
        let callback = self.on_update.lock();
        let delivered = self.progress.lock().apply(generation, result);
        let Some(state) = delivered else {
            return;
        };
        match callback.try_borrow_mut() {
            Ok(mut on_update) => (*on_update)(&state),
            Err(_) => warn!(target: "blockview", generation, "update callback re-entered, skipping"),
        };
    }

    /// Returns false when already stopped.
    fn stop(&self) -> bool {
        {
            let mut progress = self.progress.lock();
            if progress.stopped {
                return false;
            }
            progress.stopped = true;
        }
        // Waits out a callback running on another thread.
        drop(self.on_update.lock());
        true
    }
}

/// Drives a [`SnapshotSource`] on a fixed interval.
#[derive(Clone)]
pub struct SnapshotPoller {
    source: Arc<dyn SnapshotSource>,
    fetch_timeout: Duration,
}

impl SnapshotPoller {
    /// `fetch_timeout` bounds every individual fetch.
    pub fn new(source: Arc<dyn SnapshotSource>, fetch_timeout: Duration) -> Self {
        Self {
            source,
            fetch_timeout,
        }
    }

    /// Builds an HTTP poller for the configured endpoint.
    pub fn from_config(config: &PollerConfig) -> Result<Self, url::ParseError> {
        let source = HttpSnapshotSource::new(&config.endpoint)?;
        Ok(Self::new(Arc::new(source), config.fetch_timeout()))
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Issues the first fetch immediately and then one per `interval`.
    ///
    /// `on_update` runs once per applied result, never concurrently with
    /// itself. It may call [`PollHandle::stop`] or [`PollHandle::state`].
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(&self, interval: Duration, on_update: F) -> PollHandle
    where
        F: FnMut(&PollState) + Send + 'static,
    {
        let interval = if interval < MIN_INTERVAL {
            warn!(
                target: "blockview",
                requested_ms = interval.as_millis() as u64,
                "poll interval too short, clamping"
            );
            MIN_INTERVAL
        } else {
            interval
        };
        if self.fetch_timeout >= interval {
            warn!(
                target: "blockview",
                timeout_ms = self.fetch_timeout.as_millis() as u64,
                interval_ms = interval.as_millis() as u64,
                "fetch timeout not shorter than interval, slow fetches will be superseded"
            );
        }

        let shared = Arc::new(Shared::new(Box::new(on_update)));

        let started = Instant::now();
        let first = shared.begin();
        let ticker = tokio::spawn(run(
            Arc::clone(&self.source),
            Arc::clone(&shared),
            first,
            started + interval,
            interval,
            self.fetch_timeout,
        ));

        info!(
            target: "blockview",
            interval_ms = interval.as_millis() as u64,
            timeout_ms = self.fetch_timeout.as_millis() as u64,
            "snapshot poller started"
        );
        PollHandle { shared, ticker }
    }
}

async fn run(
    source: Arc<dyn SnapshotSource>,
    shared: Arc<Shared>,
    first: Option<u64>,
    next_tick: Instant,
    interval: Duration,
    fetch_timeout: Duration,
) {
    let mut fetches = JoinSet::new();
    if let Some(generation) = first {
        fetches.spawn(fetch(Arc::clone(&source), Arc::clone(&shared), generation, fetch_timeout));
    }

    let mut ticker = time::interval_at(next_tick, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(generation) = shared.begin() else {
                    break;
                };
                fetches.spawn(fetch(Arc::clone(&source), Arc::clone(&shared), generation, fetch_timeout));
            }
            Some(joined) = fetches.join_next(), if !fetches.is_empty() => {
                if let Err(err) = joined {
                    if err.is_panic() {
                        warn!(target: "blockview", error = %err, "snapshot fetch panicked");
                    }
                }
            }
        }
    }
}

async fn fetch(
    source: Arc<dyn SnapshotSource>,
    shared: Arc<Shared>,
    generation: u64,
    fetch_timeout: Duration,
) {
    let result = match time::timeout(fetch_timeout, source.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(PollError::Timeout {
            after_ms: fetch_timeout.as_millis() as u64,
        }),
    };
    shared.complete(generation, result);
}

/// Running poller.
///
/// Dropping the handle stops polling.
pub struct PollHandle {
    shared: Arc<Shared>,
    ticker: JoinHandle<()>,
}

impl PollHandle {
    /// Stops polling. Idempotent.
    ///
    /// Once this returns no further state change or callback happens;
    /// in-flight fetches are cancelled and their results ignored.
    pub fn stop(&self) {
        if self.shared.stop() {
            self.ticker.abort();
            info!(target: "blockview", "snapshot poller stopped");
        }
    }

    /// Copy of the current state.
    pub fn state(&self) -> PollState {
        self.shared.progress.lock().state.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.progress.lock().stopped
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PollStatus;
    use blockview_snapshot::SnapshotParts;

    fn snapshot(height: i64) -> Snapshot {
        Snapshot::from_parts(SnapshotParts {
            block_height: height,
            ..SnapshotParts::default()
        })
        .expect("valid snapshot")
    }

    #[test]
    fn test_older_generation_is_discarded() {
        let mut progress = Progress::default();
        let first = progress.begin().expect("first");
        let second = progress.begin().expect("second");

        assert!(progress.apply(second, Ok(snapshot(2))).is_some());
        assert!(progress.apply(first, Ok(snapshot(1))).is_none());

        assert_eq!(progress.state.current().map(Snapshot::block_height), Some(2));
        assert_eq!(progress.state.status(), PollStatus::Ready);
    }

    #[test]
    fn test_older_failure_does_not_mark_failed() {
        let mut progress = Progress::default();
        let first = progress.begin().expect("first");
        let second = progress.begin().expect("second");

        progress.apply(second, Ok(snapshot(2)));
        progress.apply(first, Err(PollError::NotFound));

        assert_eq!(progress.state.status(), PollStatus::Ready);
        assert!(progress.state.last_error().is_none());
    }

    #[test]
    fn test_stopped_refuses_new_fetches_and_results() {
        let mut progress = Progress::default();
        let generation = progress.begin().expect("first");
        progress.stopped = true;

        assert!(progress.begin().is_none());
        assert!(progress.apply(generation, Ok(snapshot(1))).is_none());
        assert!(progress.state.current().is_none());
        assert_eq!(progress.state.status(), PollStatus::Loading);
    }

    #[test]
    fn test_stop_reports_first_call_only() {
        let shared = Shared::new(Box::new(|_| {}));
        assert!(shared.stop());
        assert!(!shared.stop());
        assert!(shared.begin().is_none());
    }

    #[test]
    fn test_fetch_timeout_defaults_from_config() {
        let config = PollerConfig {
            interval_ms: 4_000,
            ..PollerConfig::default()
        };
        let poller = SnapshotPoller::from_config(&config).expect("endpoint");
        assert_eq!(poller.fetch_timeout(), Duration::from_millis(3_000));
    }
}
