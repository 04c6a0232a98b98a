//! Newsdesk HTTP Client
//!
//! A simple, type-safe HTTP client for the news-ingestion backend API.
//!
//! Both the tracker and the CLI go through this crate, so request building,
//! authentication and error decoding live in one place.
//!
//! # Example
//!
//! ```no_run
//! use newsdesk_client::NewsdeskClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = NewsdeskClient::new("http://localhost:5000/api");
//!
//!     for source in client.list_sources().await? {
//!         println!("{} {}", source.id, source.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod sources;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use newsdesk_core::dto::source::FetchAccepted;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// HTTP client for the ingestion backend API
///
/// Cloning is cheap: the underlying reqwest client shares its connection pool.
#[derive(Debug, Clone)]
pub struct NewsdeskClient {
    /// Base URL of the API (e.g., "http://localhost:5000/api")
    base_url: String,
    /// Bearer token sent with every request, if any
    token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl NewsdeskClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API (e.g., "http://localhost:5000/api")
    ///
    /// # Example
    /// ```
    /// use newsdesk_client::NewsdeskClient;
    ///
    /// let client = NewsdeskClient::new("http://localhost:5000/api");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use newsdesk_client::NewsdeskClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = NewsdeskClient::with_client("http://localhost:5000/api", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            client,
        }
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests carry a bearer token
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Start a request against `path`, relative to the base URL
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status.as_u16(), &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not needed (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status.as_u16(), &error_text));
        }

        Ok(())
    }
}
