//! Poll session state machine
//!
//! A session follows one fetch job from the moment the backend accepted it
//! until progress shows up on the data source or the tick budget runs out.
//! The transitions live here, free of timers and I/O; the poller feeds the
//! machine one observation per tick.

use chrono::{DateTime, Utc};
use newsdesk_core::domain::source::{DataSource, SourceId};

/// Progress counters captured when a job was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    pub job_count: u64,
    pub last_completion: Option<DateTime<Utc>>,
}

impl Baseline {
    pub fn capture(source: &DataSource) -> Self {
        Self {
            job_count: source.fetch_count,
            last_completion: source.last_fetch,
        }
    }

    /// Whether `observed` shows at least one job finished since the capture
    ///
    /// Either signal is enough: a higher fetch count, or a different last
    /// fetch timestamp.
    pub fn progressed(&self, observed: &DataSource) -> bool {
        observed.fetch_count > self.job_count || observed.last_fetch != self.last_completion
    }
}

/// Lifecycle of the tracking for one data source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing is being tracked
    Idle,
    /// The job-start request is in flight
    Starting,
    /// The job was accepted; `ticks_elapsed` ticks saw no progress yet
    Polling { ticks_elapsed: u32 },
    Completed { ticks: u32 },
    TimedOut { ticks: u32 },
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed { .. } | SessionState::TimedOut { .. } | SessionState::Cancelled
        )
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Progress was seen on tick `ticks`
    Completed { ticks: u32 },
    /// `ticks` ticks passed without progress
    TimedOut { ticks: u32 },
    /// Stopped by teardown or replaced by a newer session
    Cancelled,
}

/// What one tick saw
#[derive(Debug, Clone)]
pub enum Observation {
    /// The refresh succeeded and the source was in it
    Resource(DataSource),
    /// The refresh succeeded but the source was not listed
    Missing,
    /// The refresh failed
    RefreshFailed,
}

/// Result of feeding an observation to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue { ticks_elapsed: u32 },
    Finished(SessionOutcome),
}

/// One polling session
#[derive(Debug, Clone)]
pub struct PollSession {
    key: SourceId,
    baseline: Baseline,
    max_ticks: u32,
    state: SessionState,
}

impl PollSession {
    /// Creates a session in the `Polling` state with no ticks elapsed
    pub fn new(key: SourceId, baseline: Baseline, max_ticks: u32) -> Self {
        Self {
            key,
            baseline,
            max_ticks,
            state: SessionState::Polling { ticks_elapsed: 0 },
        }
    }

    pub fn key(&self) -> SourceId {
        self.key
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Applies one tick
    ///
    /// Only a successful observation of the source can complete the session;
    /// a failed refresh or a missing source counts as a tick without progress.
    /// Once terminal, the session stays where it is.
    pub fn observe(&mut self, observation: Observation) -> Step {
        let ticks_elapsed = match self.state {
            SessionState::Polling { ticks_elapsed } => ticks_elapsed,
            _ => return self.settled(),
        };
        let tick = ticks_elapsed + 1;

        let progressed = match &observation {
            Observation::Resource(observed) => self.baseline.progressed(observed),
            Observation::Missing | Observation::RefreshFailed => false,
        };

        self.state = if progressed {
            SessionState::Completed { ticks: tick }
        } else if tick >= self.max_ticks {
            SessionState::TimedOut { ticks: tick }
        } else {
            SessionState::Polling {
                ticks_elapsed: tick,
            }
        };
        self.settled()
    }

    /// Moves a live session to `Cancelled`
    pub fn cancel(&mut self) -> SessionOutcome {
        if !self.state.is_terminal() {
            self.state = SessionState::Cancelled;
        }
        match self.settled() {
            Step::Finished(outcome) => outcome,
            Step::Continue { .. } => SessionOutcome::Cancelled,
        }
    }

    fn settled(&self) -> Step {
        match self.state {
            SessionState::Completed { ticks } => Step::Finished(SessionOutcome::Completed { ticks }),
            SessionState::TimedOut { ticks } => Step::Finished(SessionOutcome::TimedOut { ticks }),
            SessionState::Cancelled => Step::Finished(SessionOutcome::Cancelled),
            SessionState::Polling { ticks_elapsed } => Step::Continue { ticks_elapsed },
            SessionState::Idle | SessionState::Starting => Step::Continue { ticks_elapsed: 0 },
        }
    }
}
