use comfy_table::Cell;
use std::fmt::Write;

use crate::dashboard::{DashboardState, FilteredView};
use crate::report::EnrichedRun;

use super::styling::{bright_green, bright_red, bright_yellow, cyan, dim, section_title};
use super::tables::{color_coded_status_cell, create_table, cyan_header};

/// Prints the run dashboard for the last fetch to stdout.
///
/// Sections:
/// - Overview: account, date range, fetch time and applied filters
/// - Counters: total, successful, failed and cancelled runs after filtering
/// - Warnings: partial days, page limits, missing definitions
/// - Runs: one row per run, newest first
/// - Status Breakdown: counts per status label, most frequent first
pub fn print_dashboard(state: &DashboardState) {
    println!("{}", render_dashboard(state));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{}", section_title(emoji, title));
}

fn format_created(run: &EnrichedRun) -> String {
    run.created_at.map_or_else(
        || "N/A".to_string(),
        |created| created.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn join_or_all(selection: &[String]) -> String {
    if selection.is_empty() {
        "All".to_string()
    } else {
        selection.join(", ")
    }
}

fn render_overview(output: &mut String, state: &DashboardState, view: &FilteredView<'_>) {
    add_section_header(output, "📊", "Overview");

    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {} → {}\n  {} {}",
        dim("Account:"),
        cyan(&view.report.account_id),
        dim("Base URL:"),
        dim(&view.report.base_url),
        dim("Date range:"),
        bright_yellow(view.report.start_date),
        bright_yellow(view.report.end_date),
        dim("Fetched at:"),
        dim(view.report.collected_at.format("%Y-%m-%d %H:%M UTC")),
    );

    if !state.filters.is_empty() {
        let filters = &state.filters;
        let _ = writeln!(
            output,
            "  {} status={} project={} environment={} job={}",
            dim("Filters:"),
            join_or_all(&filters.statuses),
            join_or_all(&filters.projects),
            join_or_all(&filters.environments),
            join_or_all(&filters.jobs),
        );
    }

    let summary = view.summary;
    let _ = writeln!(
        output,
        "\n  {} {}   {} {}   {} {}   {} {}\n",
        dim("Total Runs:"),
        bright_yellow(summary.total),
        dim("Successful:"),
        bright_green(summary.successful),
        dim("Failed:"),
        bright_red(summary.failed),
        dim("Cancelled:"),
        bright_yellow(summary.cancelled),
    );
}

fn render_warnings(output: &mut String, view: &FilteredView<'_>) {
    if view.report.warnings.is_empty() {
        return;
    }

    add_section_header(output, "⚠️", "Warnings");
    for warning in &view.report.warnings {
        let _ = writeln!(output, "  {}", bright_yellow(warning));
    }
    output.push('\n');
}

fn render_runs_table(output: &mut String, view: &FilteredView<'_>) {
    add_section_header(output, "📋", "Runs");

    if view.rows.len() < view.total_fetched {
        let _ = writeln!(
            output,
            "  {}",
            dim(format!(
                "Showing {} of {} fetched runs",
                view.rows.len(),
                view.total_fetched
            ))
        );
    }

    let mut table = create_table();
    table.set_header(cyan_header(&[
        "Run ID",
        "Status",
        "Job",
        "Project",
        "Environment",
        "Created (UTC)",
        "Duration",
    ]));

    for run in &view.rows {
        table.add_row(vec![
            Cell::new(run.id),
            color_coded_status_cell(&run.status_name),
            Cell::new(&run.job_name),
            Cell::new(&run.project_name),
            Cell::new(&run.environment_name),
            Cell::new(format_created(run)),
            Cell::new(run.duration.as_deref().unwrap_or("N/A")),
        ]);
    }

    let _ = writeln!(output, "{table}\n");
}

fn render_status_breakdown(output: &mut String, view: &FilteredView<'_>) {
    add_section_header(output, "🧮", "Status Breakdown");

    let mut table = create_table();
    table.set_header(cyan_header(&["Status", "Runs"]));
    for (label, count) in &view.status_counts {
        table.add_row(vec![color_coded_status_cell(label), Cell::new(count)]);
    }

    let _ = writeln!(output, "{table}");
}

pub(super) fn render_dashboard(state: &DashboardState) -> String {
    let mut output = String::new();

    let Some(view) = state.view() else {
        let _ = writeln!(output, "{}", bright_yellow("No runs have been fetched yet."));
        return output;
    };

    render_overview(&mut output, state, &view);
    render_warnings(&mut output, &view);

    if view.total_fetched == 0 {
        let _ = writeln!(
            output,
            "{}",
            bright_yellow("No runs found in dbt Cloud for the selected date range.")
        );
        return output;
    }

    if view.rows.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No runs match the selected filters."));
        return output;
    }

    render_runs_table(&mut output, &view);
    render_status_breakdown(&mut output, &view);

    output
}
