use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;

use crate::config::OutputFormat;
use crate::dashboard::{DashboardState, FilterOptions, RunFilter, RunSummary};
use crate::report::{EnrichedRun, FetchWarning};

use super::summary::render_dashboard;

/// Machine-readable snapshot of the filtered dashboard.
#[derive(Debug, Serialize)]
struct DashboardExport<'a> {
    account_id: &'a str,
    base_url: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    collected_at: DateTime<Utc>,
    filters: &'a RunFilter,
    total_fetched: usize,
    summary: RunSummary,
    status_counts: &'a IndexMap<String, usize>,
    filter_options: &'a FilterOptions,
    warnings: &'a [FetchWarning],
    runs: &'a [&'a EnrichedRun],
}

/// Writes the dashboard in the requested format.
///
/// - Summary: the same colored tables printed to the terminal
/// - JSON: counters, status breakdown, warnings and the filtered runs
/// - CSV: one line per filtered run, newest first
pub fn export_dashboard(
    state: &DashboardState,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            write!(output, "{}", render_dashboard(state))?;
            Ok(())
        }
        OutputFormat::Json => export_json(state, pretty, output),
        OutputFormat::Csv => export_csv(state, output),
    }
}

fn export_json(state: &DashboardState, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let view = state.view().context("No run data available to export")?;

    let export = DashboardExport {
        account_id: &view.report.account_id,
        base_url: &view.report.base_url,
        start_date: view.report.start_date,
        end_date: view.report.end_date,
        collected_at: view.report.collected_at,
        filters: &state.filters,
        total_fetched: view.total_fetched,
        summary: view.summary,
        status_counts: &view.status_counts,
        filter_options: &view.options,
        warnings: &view.report.warnings,
        runs: &view.rows,
    };

    let json = if pretty {
        serde_json::to_string_pretty(&export)?
    } else {
        serde_json::to_string(&export)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn export_csv(state: &DashboardState, output: &mut dyn Write) -> Result<()> {
    let view = state.view().context("No run data available to export")?;

    writeln!(output, "Run ID,Status,Job,Project,Environment,Created At,Duration,Job Definition ID,Status Code,Git Branch,Git SHA")?;

    for run in &view.rows {
        writeln!(
            output,
            "{},{},{},{},{},{},{},{},{},{},{}",
            run.id,
            csv_field(&run.status_name),
            csv_field(&run.job_name),
            csv_field(&run.project_name),
            csv_field(&run.environment_name),
            run.created_at
                .map(|created| created.to_rfc3339())
                .unwrap_or_default(),
            run.duration.as_deref().unwrap_or_default(),
            run.job_definition_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            run.status.map(|code| code.to_string()).unwrap_or_default(),
            csv_field(run.git_branch.as_deref().unwrap_or_default()),
            run.git_sha.as_deref().unwrap_or_default(),
        )?;
    }

    Ok(())
}
