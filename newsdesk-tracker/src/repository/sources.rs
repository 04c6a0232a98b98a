//! Sources repository
//!
//! The operations the tracker needs from the ingestion backend:
//! - Reading every data source (snapshot refresh)
//! - Activating a data source
//! - Queueing a fetch job

use anyhow::{Context, Result};
use async_trait::async_trait;
use newsdesk_client::NewsdeskClient;
use newsdesk_core::domain::source::{DataSource, SourceId};
use newsdesk_core::dto::source::FetchAccepted;

/// Repository trait for data-source operations against the backend
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Lists every data source
    ///
    /// The backend has no single-source read that is cheaper than the list,
    /// so snapshots are always taken from the full list.
    async fn list_sources(&self) -> Result<Vec<DataSource>>;

    /// Marks a data source as active
    ///
    /// # Returns
    /// The data source as stored after the update
    async fn activate(&self, id: SourceId) -> Result<DataSource>;

    /// Queues a fetch job for a data source
    ///
    /// An `Err` means the job was not started.
    async fn trigger_fetch(&self, id: SourceId) -> Result<FetchAccepted>;
}

/// HTTP implementation of SourceRepository
pub struct HttpSourceRepository {
    client: NewsdeskClient,
}

impl HttpSourceRepository {
    /// Creates a new HTTP sources repository
    pub fn new(client: NewsdeskClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceRepository for HttpSourceRepository {
    async fn list_sources(&self) -> Result<Vec<DataSource>> {
        self.client
            .list_sources()
            .await
            .context("Failed to list data sources")
    }

    async fn activate(&self, id: SourceId) -> Result<DataSource> {
        self.client
            .set_source_active(id, true)
            .await
            .with_context(|| format!("Failed to activate data source {}", id))
    }

    async fn trigger_fetch(&self, id: SourceId) -> Result<FetchAccepted> {
        self.client
            .trigger_fetch(id)
            .await
            .with_context(|| format!("Failed to queue fetch for data source {}", id))
    }
}
