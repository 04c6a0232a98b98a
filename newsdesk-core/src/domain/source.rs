//! Data source domain types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of a data source as assigned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub i64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SourceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(SourceId)
    }
}

/// Kind of upstream a data source scrapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Rss,
    Web,
    Api,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Rss => write!(f, "rss"),
            SourceType::Web => write!(f, "web"),
            SourceType::Api => write!(f, "api"),
        }
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rss" => Ok(SourceType::Rss),
            "web" => Ok(SourceType::Web),
            "api" => Ok(SourceType::Api),
            other => Err(format!(
                "unknown source type '{}' (expected rss, web or api)",
                other
            )),
        }
    }
}

/// A configured data source
///
/// Structure served by the backend list/detail endpoints. The tracker uses
/// `fetch_count` and `last_fetch` as its progress signals: the backend bumps
/// both every time a fetch job finishes, whether it succeeded or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: SourceId,
    pub name: String,
    pub source_type: SourceType,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    /// Scheduled fetch interval in seconds
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval: u64,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub last_fetch: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fetch_count: u64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub config: Option<HashMap<String, serde_json::Value>>,
}

impl DataSource {
    /// Share of fetches that succeeded, in percent
    ///
    /// Returns `None` until the source has been fetched at least once.
    pub fn success_rate(&self) -> Option<f64> {
        if self.fetch_count == 0 {
            return None;
        }
        Some(self.success_count as f64 / self.fetch_count as f64 * 100.0)
    }
}

fn default_fetch_interval() -> u64 {
    3600
}

/// Aggregate statistics returned by `GET /data-sources/stats`
///
/// The backend does not pin the shape of this payload, so it is kept as a
/// free-form map.
pub type SourceStats = HashMap<String, serde_json::Value>;

/// Parses a backend timestamp
///
/// Accepts RFC 3339 as well as naive ISO-8601 datetimes, which the backend
/// emits for columns stored without a zone. Naive values are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

mod lenient_timestamp {
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => super::parse_timestamp(value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{}'", value))),
        }
    }
}
