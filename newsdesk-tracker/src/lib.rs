//! Newsdesk Tracker
//!
//! Follows backend fetch jobs to completion from a client that can only
//! start a job and read the current state of a data source.
//!
//! Architecture:
//! - Configuration: poll interval and tick budget
//! - Repositories: HTTP communication with the ingestion backend
//! - Services: snapshot store, activation guard, notification sink
//! - Scheduler: per-source polling sessions and their registry
//!
//! [`JobTracker`] ties these together for a single owning view.
//!
//! # Example
//!
//! ```no_run
//! use newsdesk_client::NewsdeskClient;
//! use newsdesk_core::domain::source::SourceId;
//! use newsdesk_tracker::{HttpSourceRepository, JobTracker, TracingNotifier, TrackerConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = NewsdeskClient::new("http://localhost:5000/api");
//! let tracker = JobTracker::new(
//!     TrackerConfig::default(),
//!     Arc::new(HttpSourceRepository::new(client)),
//!     Arc::new(TracingNotifier),
//! );
//!
//! tracker.refresh().await?;
//! let session = tracker.fetch(SourceId(3)).await?;
//! println!("{:?}", session.outcome().await);
//! tracker.teardown();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod repository;
pub mod scheduler;
pub mod service;
mod tracker;

#[cfg(test)]
mod test_support;

pub use config::TrackerConfig;
pub use error::TrackError;
pub use repository::{HttpSourceRepository, SourceRepository};
pub use scheduler::{JobPoller, SessionHandle, SessionOutcome, SessionState};
pub use service::{
    ActivationGuard, ChannelNotifier, Notification, Notifier, Severity, SnapshotStore,
    TracingNotifier,
};
pub use tracker::JobTracker;
