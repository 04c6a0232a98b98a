//! Scheduler layer for the tracker
//!
//! This layer starts fetch jobs and polls the backend until each one
//! completes or runs out of ticks. It owns the session state machine and the
//! registry that keeps at most one session per data source.

pub mod poller;
pub mod registry;
pub mod session;

pub use poller::{JobPoller, SessionHandle};
pub use registry::{Generation, PollerRegistry, Registration};
pub use session::{Baseline, Observation, PollSession, SessionOutcome, SessionState, Step};
