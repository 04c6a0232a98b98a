//! Job activation guard
//!
//! The backend refuses to fetch an inactive data source, so a fetch request
//! goes through this guard first.

use newsdesk_core::domain::source::DataSource;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::TrackError;
use crate::repository::SourceRepository;
use crate::service::notifier::{Notification, Notifier};

/// Makes sure a data source is active before a job is started on it
pub struct ActivationGuard {
    repository: Arc<dyn SourceRepository>,
    notifier: Arc<dyn Notifier>,
}

impl ActivationGuard {
    pub fn new(repository: Arc<dyn SourceRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Returns an active version of `source`
    ///
    /// An already-active source is returned as is, without touching the
    /// backend. Otherwise exactly one activation request is issued; if it
    /// fails the error has been notified and the caller must not start a job.
    pub async fn ensure_active(&self, source: &DataSource) -> Result<DataSource, TrackError> {
        if source.is_active {
            return Ok(source.clone());
        }

        info!("Activating data source {} before fetch", source.id);
        self.notifier
            .notify(Notification::info(format!("Activating {}...", source.name)));

        match self.repository.activate(source.id).await {
            Ok(activated) => {
                self.notifier
                    .notify(Notification::success(format!("{} activated", source.name)));
                Ok(activated)
            }
            Err(e) => {
                warn!("Activation of data source {} failed: {:#}", source.id, e);
                self.notifier.notify(Notification::error(format!(
                    "Failed to activate {}: {:#}",
                    source.name, e
                )));
                Err(TrackError::ActivationFailed {
                    id: source.id,
                    reason: format!("{:#}", e),
                })
            }
        }
    }
}
