use blockview_snapshot::Snapshot;
use std::sync::Arc;

use crate::error::PollError;

/// Phase of the poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollStatus {
    /// Not started yet
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// The last fetch succeeded
    Ready,
    /// The last fetch failed
    Failed,
}

/// What a view knows about the latest snapshot.
///
/// `current` survives failed refreshes. `last_error` is set exactly when
/// the status is [`PollStatus::Failed`].
#[derive(Debug, Clone, Default)]
pub struct PollState {
    current: Option<Arc<Snapshot>>,
    status: PollStatus,
    last_error: Option<PollError>,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last successfully retrieved snapshot.
    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_deref()
    }

    pub fn status(&self) -> PollStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&PollError> {
        self.last_error.as_ref()
    }

    /// A snapshot is shown but the latest refresh failed.
    pub fn is_stale(&self) -> bool {
        self.status == PollStatus::Failed && self.current.is_some()
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.status = PollStatus::Loading;
        self.last_error = None;
    }

    pub(crate) fn apply_success(&mut self, snapshot: Snapshot) {
        self.current = Some(Arc::new(snapshot));
        self.status = PollStatus::Ready;
        self.last_error = None;
    }

    pub(crate) fn apply_failure(&mut self, error: PollError) {
        self.status = PollStatus::Failed;
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockview_snapshot::SnapshotParts;

    fn snapshot(height: i64) -> Snapshot {
        Snapshot::from_parts(SnapshotParts {
            block_height: height,
            ..SnapshotParts::default()
        })
        .expect("valid snapshot")
    }

    #[test]
    fn test_initial_state_is_idle() {
        let state = PollState::new();
        assert_eq!(state.status(), PollStatus::Idle);
        assert!(state.current().is_none());
        assert!(state.last_error().is_none());
        assert!(!state.is_stale());
    }

    #[test]
    fn test_first_failure_has_no_snapshot() {
        let mut state = PollState::new();
        state.begin_fetch();
        state.apply_failure(PollError::NotFound);

        assert_eq!(state.status(), PollStatus::Failed);
        assert_eq!(state.last_error(), Some(&PollError::NotFound));
        assert!(state.current().is_none());
        assert!(!state.is_stale());
    }

    #[test]
    fn test_failure_keeps_last_good_snapshot() {
        let mut state = PollState::new();
        state.begin_fetch();
        state.apply_success(snapshot(1));
        state.begin_fetch();
        assert_eq!(state.status(), PollStatus::Loading);
        assert_eq!(state.current().map(Snapshot::block_height), Some(1));

        state.apply_failure(PollError::unavailable("connection refused"));
        assert_eq!(state.status(), PollStatus::Failed);
        assert_eq!(state.current().map(Snapshot::block_height), Some(1));
        assert!(state.is_stale());
    }

    #[test]
    fn test_success_clears_error() {
        let mut state = PollState::new();
        state.begin_fetch();
        state.apply_failure(PollError::Timeout { after_ms: 10 });
        state.begin_fetch();
        assert!(state.last_error().is_none());

        state.apply_success(snapshot(2));
        assert_eq!(state.status(), PollStatus::Ready);
        assert!(state.last_error().is_none());
        assert_eq!(state.current().map(Snapshot::block_height), Some(2));
    }

    #[test]
    fn test_delivered_state_is_unaffected_by_later_transitions() {
        let mut state = PollState::new();
        state.begin_fetch();
        state.apply_success(snapshot(1));
        let delivered = state.clone();

        state.begin_fetch();
        state.apply_success(snapshot(2));

        assert_eq!(delivered.current().map(Snapshot::block_height), Some(1));
        assert_eq!(delivered.status(), PollStatus::Ready);
    }
}
