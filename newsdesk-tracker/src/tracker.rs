//! Fetch tracker
//!
//! The context a view owns while it is open: one snapshot store, one
//! activation guard and one job poller. Dropping the view must be paired with
//! [`JobTracker::teardown`] so no session outlives it.

use anyhow::Result;
use newsdesk_core::domain::source::SourceId;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::TrackerConfig;
use crate::error::TrackError;
use crate::repository::SourceRepository;
use crate::scheduler::{JobPoller, SessionHandle, SessionState};
use crate::service::{ActivationGuard, Notification, Notifier, Snapshot, SnapshotStore};

/// Entry point for "fetch this data source and tell me when it is done"
pub struct JobTracker {
    repository: Arc<dyn SourceRepository>,
    notifier: Arc<dyn Notifier>,
    store: SnapshotStore,
    guard: ActivationGuard,
    poller: JobPoller,
}

impl JobTracker {
    pub fn new(
        config: TrackerConfig,
        repository: Arc<dyn SourceRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = SnapshotStore::new();
        let guard = ActivationGuard::new(Arc::clone(&repository), Arc::clone(&notifier));
        let poller = JobPoller::new(
            config,
            Arc::clone(&repository),
            store.clone(),
            Arc::clone(&notifier),
        );

        Self {
            repository,
            notifier,
            store,
            guard,
            poller,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    /// Reloads every data source into the store
    pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
        self.store.refresh(self.repository.as_ref()).await
    }

    /// Activates the source if needed, starts a fetch and tracks it
    pub async fn fetch(&self, id: SourceId) -> Result<SessionHandle, TrackError> {
        let source = match self.store.get(id) {
            Some(source) => source,
            None => {
                if let Err(e) = self.refresh().await {
                    warn!("Failed to refresh data sources: {:#}", e);
                }
                match self.store.get(id) {
                    Some(source) => source,
                    None => {
                        self.notifier
                            .notify(Notification::error(format!("Unknown data source {}", id)));
                        return Err(TrackError::UnknownResource(id));
                    }
                }
            }
        };

        self.guard.ensure_active(&source).await?;
        self.poller.start(id).await
    }

    /// Tracking state for a data source
    pub fn state(&self, id: SourceId) -> SessionState {
        self.poller.state(id)
    }

    /// Cancels every live session
    ///
    /// Called once when the owning view goes away.
    pub fn teardown(&self) -> usize {
        let cancelled = self.poller.cancel_all();
        info!("Fetch tracker torn down ({} session(s) cancelled)", cancelled);
        cancelled
    }
}
