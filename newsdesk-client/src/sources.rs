//! Data source API endpoints

use crate::NewsdeskClient;
use crate::error::Result;
use newsdesk_core::domain::source::{DataSource, SourceId, SourceStats};
use newsdesk_core::dto::source::{CreateSource, FetchAccepted, UpdateSource};
use reqwest::Method;

impl NewsdeskClient {
    // =============================================================================
    // Data Source Management
    // =============================================================================

    /// List all data sources, newest first
    pub async fn list_sources(&self) -> Result<Vec<DataSource>> {
        let response = self.request(Method::GET, "/data-sources").send().await?;

        self.handle_response(response).await
    }

    /// Get a data source by ID
    pub async fn get_source(&self, id: SourceId) -> Result<DataSource> {
        let path = format!("/data-sources/{}", id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// Create a new data source
    ///
    /// # Example
    /// ```no_run
    /// # use newsdesk_client::NewsdeskClient;
    /// # use newsdesk_core::domain::source::SourceType;
    /// # use newsdesk_core::dto::source::CreateSource;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = NewsdeskClient::new("http://localhost:5000/api");
    /// let source = client.create_source(CreateSource {
    ///     name: "World news".to_string(),
    ///     source_type: SourceType::Rss,
    ///     url: "https://example.com/world.rss".to_string(),
    ///     description: None,
    ///     fetch_interval: Some(900),
    ///     config: None,
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_source(&self, req: CreateSource) -> Result<DataSource> {
        let response = self
            .request(Method::POST, "/data-sources")
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Apply a partial update to a data source
    ///
    /// # Returns
    /// The data source as stored after the update
    pub async fn update_source(&self, id: SourceId, req: &UpdateSource) -> Result<DataSource> {
        let path = format!("/data-sources/{}", id);
        let response = self.request(Method::PUT, &path).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Activate or deactivate a data source
    pub async fn set_source_active(&self, id: SourceId, is_active: bool) -> Result<DataSource> {
        self.update_source(id, &UpdateSource::activation(is_active))
            .await
    }

    /// Delete a data source
    pub async fn delete_source(&self, id: SourceId) -> Result<()> {
        let path = format!("/data-sources/{}", id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_empty_response(response).await
    }

    /// Aggregate statistics across all data sources
    pub async fn source_stats(&self) -> Result<SourceStats> {
        let response = self
            .request(Method::GET, "/data-sources/stats")
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Fetch Jobs
    // =============================================================================

    /// Queue a fetch job for a data source
    ///
    /// The backend only acknowledges the job; completion has to be observed
    /// through the source's `fetch_count` / `last_fetch` fields. An inactive
    /// source is rejected with a 400.
    pub async fn trigger_fetch(&self, id: SourceId) -> Result<FetchAccepted> {
        let path = format!("/data-sources/{}/fetch", id);
        let response = self.request(Method::POST, &path).send().await?;

        self.handle_response(response).await
    }
}
