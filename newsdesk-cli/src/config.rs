//! Configuration module
//!
//! Handles CLI configuration: where the backend lives and how to authenticate.

use newsdesk_client::NewsdeskClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ingestion backend API
    pub api_url: String,

    /// Bearer token for the backend, if it requires one
    pub token: Option<String>,
}

impl Config {
    /// Builds an API client for this configuration
    pub fn client(&self) -> NewsdeskClient {
        let client = NewsdeskClient::new(&self.api_url);
        match &self.token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }
}
