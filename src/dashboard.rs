use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use log::warn;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{DbtLensError, Result};
use crate::report::{EnrichedRun, RunReport, STATUS_CANCELLED, STATUS_ERROR, STATUS_SUCCESS};

/// Inclusive range of UTC calendar days to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range from optional bounds.
    ///
    /// Both bounds default to `today`; an end without a start covers a single
    /// day. Future dates are rejected, and a start after the end collapses to
    /// the end date.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self> {
        let end_date = end.unwrap_or(today);
        let start_date = start.unwrap_or(end_date);

        for date in [start_date, end_date] {
            if date > today {
                return Err(DbtLensError::Config(format!(
                    "{date} is in the future (today is {today})"
                )));
            }
        }

        if start_date > end_date {
            warn!("Start date {start_date} is after end date {end_date}; using {end_date} for both");
            return Ok(Self {
                start: end_date,
                end: end_date,
            });
        }

        Ok(Self {
            start: start_date,
            end: end_date,
        })
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        let count = (self.end - self.start).num_days() + 1;
        (0..count).map(move |offset| start + Duration::days(offset))
    }
}

/// Multi-select filters over the enriched runs; an empty selection keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunFilter {
    pub statuses: Vec<String>,
    pub projects: Vec<String>,
    pub environments: Vec<String>,
    pub jobs: Vec<String>,
}

impl RunFilter {
    pub fn matches(&self, run: &EnrichedRun) -> bool {
        selected(&self.statuses, &run.status_name)
            && selected(&self.projects, &run.project_name)
            && selected(&self.environments, &run.environment_name)
            && selected(&self.jobs, &run.job_name)
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
            && self.projects.is_empty()
            && self.environments.is_empty()
            && self.jobs.is_empty()
    }
}

fn selected(selection: &[String], value: &str) -> bool {
    selection.is_empty()
        || selection
            .iter()
            .any(|choice| choice.eq_ignore_ascii_case(value))
}

/// Counters shown above the run table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Distinct values available for each filter, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub statuses: Vec<String>,
    pub projects: Vec<String>,
    pub environments: Vec<String>,
    pub jobs: Vec<String>,
}

/// Read-only projection of the last fetch through the current filters.
#[derive(Debug)]
pub struct FilteredView<'a> {
    pub report: &'a RunReport,
    pub rows: Vec<&'a EnrichedRun>,
    pub total_fetched: usize,
    pub summary: RunSummary,
    pub status_counts: IndexMap<String, usize>,
    pub options: FilterOptions,
}

/// Everything the presentation layer needs: what was asked for and what came back.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub range: DateRange,
    pub filters: RunFilter,
    pub last_fetch: Option<RunReport>,
}

impl DashboardState {
    pub fn new(range: DateRange, filters: RunFilter) -> Self {
        Self {
            range,
            filters,
            last_fetch: None,
        }
    }

    #[must_use]
    pub fn with_fetch(self, report: RunReport) -> Self {
        Self {
            last_fetch: Some(report),
            ..self
        }
    }

    /// Derives the filtered view, or `None` before anything has been fetched.
    pub fn view(&self) -> Option<FilteredView<'_>> {
        let report = self.last_fetch.as_ref()?;

        let rows: Vec<&EnrichedRun> = report
            .runs
            .iter()
            .filter(|run| self.filters.matches(run))
            .collect();

        Some(FilteredView {
            report,
            total_fetched: report.runs.len(),
            summary: summarize(&rows),
            status_counts: count_statuses(&rows),
            options: filter_options(&report.runs),
            rows,
        })
    }
}

fn summarize(rows: &[&EnrichedRun]) -> RunSummary {
    let count = |label: &str| rows.iter().filter(|run| run.status_name == label).count();

    RunSummary {
        total: rows.len(),
        successful: count(STATUS_SUCCESS),
        failed: count(STATUS_ERROR),
        cancelled: count(STATUS_CANCELLED),
    }
}

/// Counts per status label, most frequent first (ties by label).
fn count_statuses(rows: &[&EnrichedRun]) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for run in rows {
        *counts.entry(run.status_name.clone()).or_default() += 1;
    }
    counts.sort_by(|a_label, a_count, b_label, b_count| {
        b_count.cmp(a_count).then_with(|| a_label.cmp(b_label))
    });
    counts
}

fn filter_options(runs: &[EnrichedRun]) -> FilterOptions {
    let distinct = |field: fn(&EnrichedRun) -> &str| -> Vec<String> {
        runs.iter()
            .map(field)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    };

    FilterOptions {
        statuses: distinct(|run| run.status_name.as_str()),
        projects: distinct(|run| run.project_name.as_str()),
        environments: distinct(|run| run.environment_name.as_str()),
        jobs: distinct(|run| run.job_name.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(id: u64, status: &str, project: &str, env: &str, job: &str) -> EnrichedRun {
        EnrichedRun {
            id,
            status_name: status.to_string(),
            job_name: job.to_string(),
            project_name: project.to_string(),
            environment_name: env.to_string(),
            created_at: None,
            duration: None,
            job_definition_id: None,
            status: None,
            git_branch: None,
            git_sha: None,
        }
    }

    fn report(runs: Vec<EnrichedRun>) -> RunReport {
        RunReport {
            account_id: "42".to_string(),
            base_url: "https://au.dbt.com".to_string(),
            start_date: day(2024, 1, 15),
            end_date: day(2024, 1, 15),
            collected_at: Utc::now(),
            runs,
            warnings: vec![],
        }
    }

    fn sample_runs() -> Vec<EnrichedRun> {
        vec![
            row(1, "Success", "Analytics", "Production", "nightly"),
            row(2, "Error", "Analytics", "Production", "hourly"),
            row(3, "Success", "Marketing", "Staging", "nightly"),
            row(4, "Cancelled", "Marketing", "Production", "hourly"),
            row(5, "Unknown (25)", "Analytics", "Staging", "adhoc"),
        ]
    }

    mod date_range {
        use super::*;

        #[test]
        fn defaults_to_today() {
            let today = day(2024, 1, 15);
            let range = DateRange::resolve(None, None, today).unwrap();
            assert_eq!(range, DateRange { start: today, end: today });
        }

        #[test]
        fn start_only_runs_until_today() {
            let range = DateRange::resolve(Some(day(2024, 1, 13)), None, day(2024, 1, 15)).unwrap();
            assert_eq!(range.days().count(), 3);
        }

        #[test]
        fn rejects_future_dates() {
            let result = DateRange::resolve(None, Some(day(2024, 1, 16)), day(2024, 1, 15));
            assert!(matches!(result, Err(DbtLensError::Config(_))));
        }

        #[test]
        fn start_after_end_collapses_to_end() {
            let range =
                DateRange::resolve(Some(day(2024, 1, 14)), Some(day(2024, 1, 12)), day(2024, 1, 15))
                    .unwrap();
            assert_eq!(range.start, day(2024, 1, 12));
            assert_eq!(range.end, day(2024, 1, 12));
        }

        #[test]
        fn days_cover_range_inclusively_across_month_end() {
            let range = DateRange {
                start: day(2024, 1, 30),
                end: day(2024, 2, 1),
            };
            let days: Vec<_> = range.days().collect();
            assert_eq!(days, vec![day(2024, 1, 30), day(2024, 1, 31), day(2024, 2, 1)]);
        }
    }

    #[test]
    fn test_view_is_none_before_fetch() {
        let state = DashboardState::new(
            DateRange::resolve(None, None, day(2024, 1, 15)).unwrap(),
            RunFilter::default(),
        );
        assert!(state.view().is_none());
    }

    #[test]
    fn test_unfiltered_view_counts_everything() {
        let state = DashboardState::new(
            DateRange::resolve(None, None, day(2024, 1, 15)).unwrap(),
            RunFilter::default(),
        )
        .with_fetch(report(sample_runs()));

        let view = state.view().unwrap();
        assert_eq!(view.total_fetched, 5);
        assert_eq!(
            view.summary,
            RunSummary {
                total: 5,
                successful: 2,
                failed: 1,
                cancelled: 1,
            }
        );
        assert_eq!(view.status_counts.get_index(0), Some((&"Success".to_string(), &2)));
        assert_eq!(view.options.projects, vec!["Analytics", "Marketing"]);
        assert_eq!(view.options.jobs, vec!["adhoc", "hourly", "nightly"]);
    }

    #[test]
    fn test_filters_combine_across_facets() {
        let filters = RunFilter {
            environments: vec!["production".to_string()],
            jobs: vec!["hourly".to_string(), "nightly".to_string()],
            ..RunFilter::default()
        };
        let state = DashboardState::new(
            DateRange::resolve(None, None, day(2024, 1, 15)).unwrap(),
            filters,
        )
        .with_fetch(report(sample_runs()));

        let view = state.view().unwrap();
        let ids: Vec<u64> = view.rows.iter().map(|run| run.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert_eq!(view.total_fetched, 5);
        assert_eq!(view.summary.total, 3);
        assert_eq!(view.summary.successful, 1);
        assert_eq!(view.summary.failed, 1);
        assert_eq!(view.summary.cancelled, 1);
        // Options always reflect the whole fetch
        assert_eq!(view.options.environments, vec!["Production", "Staging"]);
    }

    #[test]
    fn test_filter_matching_nothing() {
        let filters = RunFilter {
            statuses: vec!["Running".to_string()],
            ..RunFilter::default()
        };
        let state = DashboardState::new(
            DateRange::resolve(None, None, day(2024, 1, 15)).unwrap(),
            filters,
        )
        .with_fetch(report(sample_runs()));

        let view = state.view().unwrap();
        assert!(view.rows.is_empty());
        assert_eq!(view.summary, RunSummary::default());
        assert!(view.status_counts.is_empty());
    }
}
