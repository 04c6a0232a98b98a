//! Job poller
//!
//! Starts fetch jobs and follows each one to completion. The backend has no
//! push channel, so every session re-reads the data sources on a fixed
//! interval and compares the tracked source against the baseline captured
//! when the job was accepted. Each session runs in its own task.

use newsdesk_core::domain::source::{DataSource, SourceId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

use super::registry::{Generation, PollerRegistry, Registration};
use super::session::{Baseline, Observation, PollSession, SessionOutcome, SessionState, Step};
use crate::config::TrackerConfig;
use crate::error::TrackError;
use crate::repository::SourceRepository;
use crate::service::{Notification, Notifier, SnapshotStore};

/// Handle on a running session
pub struct SessionHandle {
    id: SourceId,
    generation: Generation,
    join: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Waits for the session to reach a terminal state
    pub async fn outcome(self) -> SessionOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Session task for data source {} failed: {}", self.id, e);
                SessionOutcome::Cancelled
            }
        }
    }
}

/// Registry entry of a start that has not reached `Polling` yet
///
/// Removed on drop, so a `start` future dropped mid-request leaves nothing
/// behind.
struct PendingStart<'a> {
    registry: &'a PollerRegistry<SourceId>,
    id: SourceId,
    generation: Option<Generation>,
}

impl<'a> PendingStart<'a> {
    fn new(registry: &'a PollerRegistry<SourceId>, id: SourceId, generation: Generation) -> Self {
        Self {
            registry,
            id,
            generation: Some(generation),
        }
    }

    /// Hands the entry over to the session task
    fn disarm(mut self) {
        self.generation = None;
    }
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if let Some(generation) = self.generation.take() {
            self.registry.unregister(&self.id, generation);
        }
    }
}

/// Starts fetch jobs and polls for their completion
#[derive(Clone)]
pub struct JobPoller {
    config: TrackerConfig,
    repository: Arc<dyn SourceRepository>,
    store: SnapshotStore,
    notifier: Arc<dyn Notifier>,
    registry: Arc<PollerRegistry<SourceId>>,
}

impl JobPoller {
    /// Creates a new job poller with an empty registry
    pub fn new(
        config: TrackerConfig,
        repository: Arc<dyn SourceRepository>,
        store: SnapshotStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            repository,
            store,
            notifier,
            registry: Arc::new(PollerRegistry::new()),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn registry(&self) -> &PollerRegistry<SourceId> {
        &self.registry
    }

    /// Tracking state for a data source
    pub fn state(&self, id: SourceId) -> SessionState {
        self.registry.state(&id)
    }

    /// Starts a fetch job for `id` and tracks it
    ///
    /// Any session already tracking `id` is cancelled silently. Failures are
    /// notified before they are returned. A start that is itself replaced by a
    /// newer start before its job is accepted returns `Superseded` and stays
    /// silent.
    pub async fn start(&self, id: SourceId) -> Result<SessionHandle, TrackError> {
        let registration = self.registry.register(id);
        let generation = registration.generation;
        let pending = PendingStart::new(&self.registry, id, generation);

        let source = match self.known_source(id).await {
            Some(source) => source,
            None => {
                if self.registry.unregister(&id, generation) {
                    self.notifier
                        .notify(Notification::error(format!("Unknown data source {}", id)));
                }
                return Err(TrackError::UnknownResource(id));
            }
        };

        let accepted = match self.repository.trigger_fetch(id).await {
            Ok(accepted) => accepted,
            Err(e) => {
                if !self.registry.unregister(&id, generation) {
                    debug!("Rejected start for data source {} was already superseded", id);
                    return Err(TrackError::Superseded(id));
                }
                error!("Fetch for data source {} was rejected: {:#}", id, e);
                self.notifier.notify(Notification::error(format!(
                    "Failed to start fetch for {}: {:#}",
                    source.name, e
                )));
                return Err(TrackError::StartRejected {
                    id,
                    reason: format!("{:#}", e),
                });
            }
        };

        // Captured before any refresh: a job that finishes before the first
        // tick must still show up as progress.
        let baseline = Baseline::capture(&self.store.get(id).unwrap_or_else(|| source.clone()));

        if !self
            .registry
            .update(&id, generation, SessionState::Polling { ticks_elapsed: 0 })
        {
            debug!("Start for data source {} was superseded after acceptance", id);
            return Err(TrackError::Superseded(id));
        }
        pending.disarm();

        info!(
            "Fetch job {} queued for data source {} (baseline: {} fetches)",
            accepted.task_id, id, baseline.job_count
        );
        self.notifier
            .notify(Notification::success(format!("Fetch started for {}", source.name)));

        let session = PollSession::new(id, baseline, self.config.max_ticks);
        let poller = self.clone();
        let join = tokio::spawn(async move { poller.run_session(session, registration, source).await });

        Ok(SessionHandle {
            id,
            generation,
            join,
        })
    }

    /// Cancels tracking for one data source
    pub fn cancel(&self, id: SourceId) -> bool {
        let cancelled = self.registry.cancel(&id);
        if cancelled {
            debug!("Cancelled tracking for data source {}", id);
        }
        cancelled
    }

    /// Cancels every live session
    pub fn cancel_all(&self) -> usize {
        let cancelled = self.registry.cancel_all();
        if cancelled > 0 {
            info!("Cancelled {} tracking session(s)", cancelled);
        }
        cancelled
    }

    /// Returns the stored source, refreshing once if it is not known yet
    async fn known_source(&self, id: SourceId) -> Option<DataSource> {
        if let Some(source) = self.store.get(id) {
            return Some(source);
        }

        if let Err(e) = self.store.refresh(self.repository.as_ref()).await {
            warn!("Failed to refresh data sources: {:#}", e);
        }
        self.store.get(id)
    }

    /// Drives one session until it reaches a terminal state
    async fn run_session(
        self,
        mut session: PollSession,
        registration: Registration,
        source: DataSource,
    ) -> SessionOutcome {
        let id = session.key();
        let Registration { generation, token } = registration;

        // Tick 0 only refreshes the view.
        self.refresh(id).await;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Session for data source {} cancelled", id);
                    return session.cancel();
                }
                _ = time::sleep(self.config.poll_interval) => {}
            }

            // The refresh is never aborted; its result is dropped below if
            // the session was cancelled or replaced meanwhile.
            let observation = self.refresh(id).await;
            if !self.registry.is_current(&id, generation) {
                debug!("Discarding refresh for replaced session of data source {}", id);
                return session.cancel();
            }

            match session.observe(observation) {
                Step::Continue { ticks_elapsed } => {
                    debug!(
                        "No progress on data source {} after tick {}/{}",
                        id, ticks_elapsed, self.config.max_ticks
                    );
                    if !self
                        .registry
                        .update(&id, generation, SessionState::Polling { ticks_elapsed })
                    {
                        return session.cancel();
                    }
                }
                Step::Finished(outcome) => {
                    return self.finish(id, generation, outcome, &source.name);
                }
            }
        }
    }

    /// Refreshes the snapshot store and reads the tracked source from it
    ///
    /// A failed refresh is logged and reported as an observation; it never
    /// ends the session.
    async fn refresh(&self, id: SourceId) -> Observation {
        match self.store.refresh(self.repository.as_ref()).await {
            Ok(snapshot) => match snapshot.get(id) {
                Some(source) => Observation::Resource(source.clone()),
                None => {
                    debug!("Data source {} missing from refresh", id);
                    Observation::Missing
                }
            },
            Err(e) => {
                warn!("Refresh for data source {} failed: {:#}", id, e);
                Observation::RefreshFailed
            }
        }
    }

    fn finish(
        &self,
        id: SourceId,
        generation: Generation,
        outcome: SessionOutcome,
        name: &str,
    ) -> SessionOutcome {
        if !self.registry.unregister(&id, generation) {
            return SessionOutcome::Cancelled;
        }

        match outcome {
            SessionOutcome::Completed { ticks } => {
                info!("Fetch for data source {} completed after {} tick(s)", id, ticks);
                self.notifier
                    .notify(Notification::success(format!("Fetch completed for {}", name)));
            }
            SessionOutcome::TimedOut { ticks } => {
                // No notification: the job may still finish, and the next
                // manual refresh will show it.
                info!(
                    "Stopped tracking data source {} after {} tick(s) without progress",
                    id, ticks
                );
            }
            SessionOutcome::Cancelled => {}
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Severity;
    use crate::test_support::{RecordingNotifier, ScriptedRepository, source, wait_until};
    use std::time::Duration;
    use tokio::time::Instant;

    struct Fixture {
        repository: Arc<ScriptedRepository>,
        notifier: Arc<RecordingNotifier>,
        store: SnapshotStore,
        poller: JobPoller,
    }

    fn fixture(backend: Vec<DataSource>, config: TrackerConfig) -> Fixture {
        let repository = Arc::new(ScriptedRepository::new(backend.clone()));
        let notifier = Arc::new(RecordingNotifier::default());
        let store = SnapshotStore::new();
        store.replace_all(backend);
        let poller = JobPoller::new(config, repository.clone(), store.clone(), notifier.clone());
        Fixture {
            repository,
            notifier,
            store,
            poller,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_detected_on_second_tick() {
        let f = fixture(vec![source(1, 5, None)], TrackerConfig::default());
        f.repository.push_list(vec![source(1, 5, None)]); // tick 0
        f.repository.push_list(vec![source(1, 5, None)]); // tick 1
        f.repository
            .push_list(vec![source(1, 6, Some("2024-01-01T00:00:02Z"))]); // tick 2

        let handle = f.poller.start(SourceId(1)).await.unwrap();
        assert_eq!(handle.outcome().await, SessionOutcome::Completed { ticks: 2 });

        assert_eq!(f.repository.list_calls(), 3);
        assert_eq!(f.notifier.count_containing("Fetch completed"), 1);
        assert_eq!(
            f.notifier.severities(),
            vec![Severity::Success, Severity::Success]
        );
        assert!(!f.poller.registry().contains(&SourceId(1)));

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(f.repository.list_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_source_times_out_silently() {
        let f = fixture(vec![source(1, 3, None)], TrackerConfig::default());
        let started = Instant::now();

        let handle = f.poller.start(SourceId(1)).await.unwrap();
        assert_eq!(handle.outcome().await, SessionOutcome::TimedOut { ticks: 30 });

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(61));
        // tick 0 plus 30 counted ticks
        assert_eq!(f.repository.list_calls(), 31);
        assert_eq!(f.notifier.all().len(), 1);
        assert_eq!(f.notifier.count_containing("Fetch started"), 1);
        assert!(!f.poller.registry().contains(&SourceId(1)));
        assert_eq!(f.poller.state(SourceId(1)), SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_stops_every_session() {
        let backend = vec![source(1, 0, None), source(2, 0, None), source(3, 0, None)];
        let f = fixture(backend, TrackerConfig::default());

        let mut handles = Vec::new();
        for id in 1..=3 {
            handles.push(f.poller.start(SourceId(id)).await.unwrap());
        }
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(f.poller.registry().len(), 3);

        assert_eq!(f.poller.cancel_all(), 3);
        for handle in handles {
            assert_eq!(handle.outcome().await, SessionOutcome::Cancelled);
        }

        let calls = f.repository.list_calls();
        time::sleep(Duration::from_secs(300)).await;
        assert_eq!(f.repository.list_calls(), calls);
        assert!(f.poller.registry().is_empty());
        assert_eq!(f.notifier.count_containing("Fetch completed"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_refresh_cannot_revive_cancelled_session() {
        let f = fixture(vec![source(1, 1, None)], TrackerConfig::default());

        let handle = f.poller.start(SourceId(1)).await.unwrap();
        wait_until(|| f.repository.list_calls() == 1).await;

        f.repository.hold_lists();
        wait_until(|| f.repository.list_calls() == 2).await;

        assert!(f.poller.cancel(SourceId(1)));
        f.repository.set_backend(vec![source(1, 2, Some("2024-01-01T00:00:02Z"))]);
        f.repository.release_lists();

        assert_eq!(handle.outcome().await, SessionOutcome::Cancelled);
        assert_eq!(f.notifier.count_containing("Fetch completed"), 0);
        assert!(!f.poller.registry().contains(&SourceId(1)));
        // the late result still lands in the shared store
        assert_eq!(f.store.get(SourceId(1)).unwrap().fetch_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_session_does_not_unregister_its_replacement() {
        let f = fixture(vec![source(1, 1, None)], TrackerConfig::default());

        let first = f.poller.start(SourceId(1)).await.unwrap();
        wait_until(|| f.repository.list_calls() == 1).await;
        f.repository.hold_lists();
        wait_until(|| f.repository.list_calls() == 2).await;

        // Replacement starts while the first session's tick 1 is in flight.
        f.repository.release_lists();
        let second = f.poller.start(SourceId(1)).await.unwrap();

        assert_eq!(first.outcome().await, SessionOutcome::Cancelled);
        assert!(f.poller.registry().is_current(&SourceId(1), second.generation()));

        f.repository.set_backend(vec![source(1, 2, None)]);
        assert_eq!(second.outcome().await, SessionOutcome::Completed { ticks: 1 });
        assert_eq!(f.notifier.count_containing("Fetch completed"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_uses_latest_baseline() {
        let config = TrackerConfig::default().with_max_ticks(3);
        let f = fixture(vec![source(1, 5, None)], config);

        let first = f.poller.start(SourceId(1)).await.unwrap();
        f.store.replace_all(vec![source(1, 6, None)]);
        f.repository.set_backend(vec![source(1, 6, None)]);
        let second = f.poller.start(SourceId(1)).await.unwrap();

        assert_eq!(f.poller.registry().len(), 1);
        assert_eq!(first.outcome().await, SessionOutcome::Cancelled);
        // With the first baseline (5) this would complete on tick 1.
        assert_eq!(second.outcome().await, SessionOutcome::TimedOut { ticks: 3 });
        assert_eq!(f.repository.fetch_calls(), 2);
        assert_eq!(f.notifier.count_containing("Fetch completed"), 0);
        assert!(f.poller.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_start_registers_nothing() {
        let f = fixture(vec![source(1, 0, None)], TrackerConfig::default());
        f.repository.fail_fetches();

        let err = f.poller.start(SourceId(1)).await.err().unwrap();

        assert!(matches!(err, TrackError::StartRejected { .. }));
        assert!(f.poller.registry().is_empty());
        assert_eq!(f.notifier.severities(), vec![Severity::Error]);
        assert_eq!(f.repository.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failures_are_retried() {
        let f = fixture(vec![source(1, 2, None)], TrackerConfig::default());
        f.repository.push_list_failure(); // tick 0
        f.repository.push_list_failure(); // tick 1
        f.repository.push_list(vec![source(1, 3, None)]); // tick 2

        let handle = f.poller.start(SourceId(1)).await.unwrap();
        assert_eq!(handle.outcome().await, SessionOutcome::Completed { ticks: 2 });
        assert_eq!(f.notifier.count_containing("Fetch completed"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_source_is_refreshed_then_rejected() {
        let f = fixture(vec![], TrackerConfig::default());

        let err = f.poller.start(SourceId(42)).await.err().unwrap();

        assert!(matches!(err, TrackError::UnknownResource(SourceId(42))));
        assert_eq!(f.repository.list_calls(), 1);
        assert_eq!(f.repository.fetch_calls(), 0);
        assert_eq!(f.notifier.severities(), vec![Severity::Error]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_are_independent() {
        let backend = vec![source(1, 0, None), source(2, 0, None)];
        let f = fixture(backend, TrackerConfig::default());

        let a = f.poller.start(SourceId(1)).await.unwrap();
        let b = f.poller.start(SourceId(2)).await.unwrap();
        time::sleep(Duration::from_secs(5)).await;

        assert!(f.poller.cancel(SourceId(1)));
        assert_eq!(a.outcome().await, SessionOutcome::Cancelled);
        assert!(matches!(
            f.poller.state(SourceId(2)),
            SessionState::Polling { ticks_elapsed } if ticks_elapsed >= 2
        ));

        f.repository.set_backend(vec![source(1, 0, None), source(2, 1, None)]);
        assert!(matches!(b.outcome().await, SessionOutcome::Completed { .. }));
        assert_eq!(f.notifier.count_containing("Fetch completed for source-2"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_start_leaves_no_entry() {
        let f = fixture(vec![source(1, 0, None)], TrackerConfig::default());
        let _gate = f.repository.hold_next_fetch();

        let result = time::timeout(Duration::from_secs(1), f.poller.start(SourceId(1))).await;

        assert!(result.is_err());
        assert_eq!(f.repository.fetch_calls(), 1);
        assert!(f.poller.registry().is_empty());
        assert_eq!(f.poller.state(SourceId(1)), SessionState::Idle);
        assert!(f.notifier.all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_replaced_while_in_flight_stays_silent() {
        let f = fixture(
            vec![source(1, 0, None)],
            TrackerConfig::default().with_max_ticks(2),
        );
        let gate = f.repository.hold_next_fetch();
        let first = tokio::spawn({
            let poller = f.poller.clone();
            async move { poller.start(SourceId(1)).await }
        });
        wait_until(|| f.repository.fetch_calls() == 1).await;

        let second = f.poller.start(SourceId(1)).await.unwrap();
        gate.add_permits(1);
        let first = first.await.unwrap();

        assert!(matches!(first, Err(TrackError::Superseded(SourceId(1)))));
        assert_eq!(f.notifier.count_containing("Fetch started"), 1);
        assert!(f.poller.registry().is_current(&SourceId(1), second.generation()));

        assert_eq!(second.outcome().await, SessionOutcome::TimedOut { ticks: 2 });
        assert!(f.poller.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_of_replaced_start_is_not_notified() {
        let f = fixture(vec![source(1, 0, None)], TrackerConfig::default());
        let gate = f.repository.hold_next_fetch();
        let first = tokio::spawn({
            let poller = f.poller.clone();
            async move { poller.start(SourceId(1)).await }
        });
        wait_until(|| f.repository.fetch_calls() == 1).await;

        let second = f.poller.start(SourceId(1)).await.unwrap();
        f.repository.fail_fetches();
        gate.add_permits(1);
        let first = first.await.unwrap();

        assert!(matches!(first, Err(TrackError::Superseded(SourceId(1)))));
        assert_eq!(f.notifier.severities(), vec![Severity::Success]);
        assert!(f.poller.registry().is_current(&SourceId(1), second.generation()));
        f.poller.cancel_all();
        assert_eq!(second.outcome().await, SessionOutcome::Cancelled);
    }
}
