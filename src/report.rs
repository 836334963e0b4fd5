use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const STATUS_SUCCESS: &str = "Success";
pub const STATUS_ERROR: &str = "Error";
pub const STATUS_CANCELLED: &str = "Cancelled";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub account_id: String,
    pub base_url: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub collected_at: DateTime<Utc>,
    pub runs: Vec<EnrichedRun>,
    pub warnings: Vec<FetchWarning>,
}

/// A run with job, project and environment ids resolved to names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRun {
    pub id: u64,
    pub status_name: String,
    pub job_name: String,
    pub project_name: String,
    pub environment_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub duration: Option<String>,
    pub job_definition_id: Option<u64>,
    pub status: Option<i64>,
    pub git_branch: Option<String>,
    pub git_sha: Option<String>,
}

/// Non-fatal problems encountered while building a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchWarning {
    /// A page request failed mid-scan; earlier runs for the day were kept
    PartialDay {
        date: NaiveDate,
        runs_kept: usize,
        reason: String,
    },
    /// The page limit was reached before the scan could prove it was done
    PageLimitReached { date: NaiveDate, max_pages: usize },
    DefinitionsUnavailable { reason: String },
    MissingStatus { runs: usize },
}

impl fmt::Display for FetchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartialDay {
                date,
                runs_kept,
                reason,
            } => write!(
                f,
                "{date}: request failed during pagination ({reason}); showing {runs_kept} runs found before the failure"
            ),
            Self::PageLimitReached { date, max_pages } => write!(
                f,
                "{date}: stopped after checking {max_pages} pages; results might be incomplete"
            ),
            Self::DefinitionsUnavailable { reason } => write!(
                f,
                "job/project/environment names unavailable ({reason}); showing raw ids"
            ),
            Self::MissingStatus { runs } => {
                write!(f, "{runs} runs had no status field; shown as 'Status N/A'")
            }
        }
    }
}
