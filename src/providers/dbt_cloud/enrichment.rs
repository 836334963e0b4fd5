use std::collections::HashMap;

use log::warn;

use crate::report::{EnrichedRun, STATUS_CANCELLED, STATUS_ERROR, STATUS_SUCCESS};

use super::types::{Definitions, Run};

pub const STATUS_NOT_AVAILABLE: &str = "Status N/A";

/// Maps a dbt Cloud run status code to its display label.
pub fn status_label(code: i64) -> String {
    match code {
        10 => STATUS_SUCCESS.to_string(),
        20 => STATUS_ERROR.to_string(),
        30 => STATUS_CANCELLED.to_string(),
        other => format!("Unknown ({other})"),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct JobInfo {
    name: String,
    project_id: Option<u64>,
    environment_id: Option<u64>,
}

/// Id → name lookups built from one set of definition listings.
#[derive(Debug, Default)]
pub struct LookupMaps {
    jobs: HashMap<u64, JobInfo>,
    projects: HashMap<u64, String>,
    environments: HashMap<u64, String>,
}

impl LookupMaps {
    pub fn from_definitions(definitions: &Definitions) -> Self {
        let jobs = definitions
            .jobs
            .iter()
            .map(|job| {
                (
                    job.id,
                    JobInfo {
                        name: job.name.clone().unwrap_or_else(|| format!("Job {}", job.id)),
                        project_id: job.project_id,
                        environment_id: job.environment_id,
                    },
                )
            })
            .collect();

        let projects = definitions
            .projects
            .iter()
            .map(|p| (p.id, p.name.clone().unwrap_or_else(|| format!("Project {}", p.id))))
            .collect();

        let environments = definitions
            .environments
            .iter()
            .map(|e| (e.id, e.name.clone().unwrap_or_else(|| format!("Env {}", e.id))))
            .collect();

        Self {
            jobs,
            projects,
            environments,
        }
    }

    fn enrich_run(&self, run: &Run) -> EnrichedRun {
        let job = run.job_definition_id.and_then(|id| self.jobs.get(&id));

        let job_name = match (job, run.job_definition_id) {
            (Some(job), _) => job.name.clone(),
            (None, Some(id)) => format!("Unknown Job {id}"),
            (None, None) => "Unknown Job".to_string(),
        };

        let project_id = job.and_then(|job| job.project_id);
        let environment_id = job.and_then(|job| job.environment_id);

        EnrichedRun {
            id: run.id,
            status_name: run
                .status
                .map_or_else(|| STATUS_NOT_AVAILABLE.to_string(), status_label),
            job_name,
            project_name: resolve_name(&self.projects, project_id, "Unknown Project"),
            environment_name: resolve_name(&self.environments, environment_id, "Unknown Env"),
            created_at: run.created_at_utc(),
            duration: run.duration.clone(),
            job_definition_id: run.job_definition_id,
            status: run.status,
            git_branch: run.git_branch.clone(),
            git_sha: run.git_sha.clone(),
        }
    }
}

fn resolve_name(names: &HashMap<u64, String>, id: Option<u64>, unknown: &str) -> String {
    match id {
        Some(id) => names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("{unknown} {id}")),
        None => unknown.to_string(),
    }
}

/// Resolves names for every run and orders the result newest first.
///
/// Missing lookups never fail; they fall back to labels embedding the raw id.
pub fn enrich_runs(runs: &[Run], lookups: &LookupMaps) -> Vec<EnrichedRun> {
    let missing_status = runs.iter().filter(|run| run.status.is_none()).count();
    if missing_status > 0 {
        warn!("{missing_status} runs have no 'status' field; cannot determine status names");
    }

    let mut enriched: Vec<EnrichedRun> = runs.iter().map(|run| lookups.enrich_run(run)).collect();
    // `None` sorts lowest, so runs without a timestamp end up last
    enriched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    enriched
}
