//! Error types for the tracker

use newsdesk_core::domain::source::SourceId;
use thiserror::Error;

/// Errors surfaced by the activation guard and the job poller
///
/// Every variant has already been reported through the notifier by the time
/// the caller sees it; callers only need it to decide whether to go on.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The source is not in the snapshot store, even after a refresh
    #[error("Unknown data source {0}")]
    UnknownResource(SourceId),

    /// The source could not be switched to active
    #[error("Failed to activate data source {id}: {reason}")]
    ActivationFailed { id: SourceId, reason: String },

    /// The backend refused to queue the fetch job
    #[error("Failed to start fetch for data source {id}: {reason}")]
    StartRejected { id: SourceId, reason: String },

    /// A newer start for the same source replaced this one before it was tracked
    #[error("Fetch tracking for data source {0} was superseded")]
    Superseded(SourceId),
}

impl TrackError {
    /// The source the error is about
    pub fn source_id(&self) -> SourceId {
        match self {
            Self::UnknownResource(id) | Self::Superseded(id) => *id,
            Self::ActivationFailed { id, .. } | Self::StartRejected { id, .. } => *id,
        }
    }
}
