//! Data source DTOs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::source::{SourceId, SourceType};

/// Request to create a new data source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSource {
    pub name: String,
    pub source_type: SourceType,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<HashMap<String, serde_json::Value>>,
}

/// Partial update of a data source
///
/// Only fields that are set are sent; the backend leaves the rest untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<HashMap<String, serde_json::Value>>,
}

impl UpdateSource {
    /// Update that only flips the activation flag
    pub fn activation(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }

    /// Returns true when no field would be sent
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.fetch_interval.is_none()
            && self.is_active.is_none()
            && self.config.is_none()
    }
}

/// Acknowledgement returned when a fetch job has been queued (HTTP 202)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchAccepted {
    #[serde(default)]
    pub message: String,
    pub task_id: String,
    pub source_id: SourceId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_update_only_sends_flag() {
        let body = serde_json::to_value(UpdateSource::activation(true)).unwrap();
        assert_eq!(body, serde_json::json!({ "is_active": true }));
    }

    #[test]
    fn test_empty_update() {
        assert!(UpdateSource::default().is_empty());
        assert!(!UpdateSource::activation(false).is_empty());
    }

    #[test]
    fn test_create_source_serializes_type_lowercase() {
        let req = CreateSource {
            name: "Wire".to_string(),
            source_type: SourceType::Web,
            url: "https://example.com".to_string(),
            description: None,
            fetch_interval: Some(600),
            config: None,
        };
        let body = serde_json::to_value(req).unwrap();
        assert_eq!(body["source_type"], "web");
        assert_eq!(body["fetch_interval"], 600);
        assert!(body.get("description").is_none());
    }

    #[test]
    fn test_fetch_accepted_parses() {
        let json = r#"{"message": "queued", "task_id": "abc-123", "source_id": 4}"#;
        let accepted: FetchAccepted = serde_json::from_str(json).unwrap();
        assert_eq!(accepted.source_id, SourceId(4));
        assert_eq!(accepted.task_id, "abc-123");
    }
}
