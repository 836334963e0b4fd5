use chrono::{DateTime, Utc};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::window::parse_created_at;

/// A single execution of a dbt Cloud job.
///
/// Only the fields the monitor displays are modelled; everything except `id`
/// may be missing from the API payload. Values of the wrong type in the
/// fields the scan and enrichment rely on are read as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: u64,
    /// Raw ISO-8601 creation timestamp as returned by the API
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub job_definition_id: Option<u64>,
    /// Numeric status code (10 = success, 20 = error, 30 = cancelled)
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<i64>,
    /// Human-readable duration, e.g. "00:03:12"
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub git_sha: Option<String>,
}

impl Run {
    /// Creation time normalized to UTC, or `None` when absent or unparsable.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_created_at)
    }
}

/// A job definition from `/jobs/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub environment_id: Option<u64>,
}

/// A project from `/projects/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// A deployment environment from `/environments/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// All definition listings needed to enrich runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    pub jobs: Vec<JobDefinition>,
    pub projects: Vec<Project>,
    pub environments: Vec<Environment>,
}

/// One page of a v2 list endpoint:
/// `{"data": [...], "extra": {"pagination": {"total_count": N}}}`.
///
/// Items that do not decode as `T` are dropped individually; `received`
/// still counts them so offsets stay aligned with the server.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Page<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    data: Vec<Lenient<T>>,
    #[serde(default)]
    extra: Option<PageExtra>,
}

impl<T> Page<T> {
    /// Number of items the server returned, decodable or not.
    pub fn received(&self) -> usize {
        self.data.len()
    }

    pub fn into_items(self) -> Vec<T> {
        self.data.into_iter().filter_map(|item| item.0).collect()
    }

    /// Server-reported size of the whole collection, when present.
    pub fn total_count(&self) -> Option<usize> {
        self.extra
            .as_ref()
            .and_then(|extra| extra.pagination.as_ref())
            .and_then(|pagination| pagination.total_count)
    }
}

#[derive(Debug, Deserialize)]
struct PageExtra {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    total_count: Option<usize>,
}

/// A list item that failed to decode becomes `Lenient(None)` instead of failing the page.
#[derive(Debug)]
struct Lenient<T>(Option<T>);

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let item = serde_json::from_value(value)
            .inspect_err(|e| debug!("Skipping malformed list item: {e}"))
            .ok();
        Ok(Self(item))
    }
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
