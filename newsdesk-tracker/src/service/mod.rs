//! Service layer
//!
//! Services hold the state and policies the poller relies on: the snapshot
//! store it reads, the guard that runs before a job is started, and the sink
//! user-visible messages go to.
//!
//! Collaborators are trait-based to enable testing and dependency injection.

mod activation;
mod notifier;
mod snapshot;

pub use activation::ActivationGuard;
pub use notifier::{ChannelNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use snapshot::{Snapshot, SnapshotStore};
