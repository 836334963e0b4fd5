use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::config::{Config, OutputFormat, Overrides, Settings};
use crate::dashboard::{DashboardState, DateRange, RunFilter};
use crate::output::{export_dashboard, print_dashboard};
use crate::providers::DbtCloudProvider;

#[derive(Parser)]
#[command(name = "dbtlens")]
#[command(author, version, about = "dbt Cloud Run Monitor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a config file (TOML, JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show job runs for a range of UTC days
    Runs(RunsArgs),
}

#[derive(Args)]
struct RunsArgs {
    #[arg(short, long, env = "DBT_CLOUD_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(short, long, env = "DBT_CLOUD_ACCOUNT_ID")]
    account_id: Option<String>,

    #[arg(short, long, env = "DBT_CLOUD_BASE_URL")]
    base_url: Option<String>,

    /// First day to include, YYYY-MM-DD (defaults to the end date)
    #[arg(short, long)]
    start: Option<NaiveDate>,

    /// Last day to include, YYYY-MM-DD (defaults to today, UTC)
    #[arg(short, long)]
    end: Option<NaiveDate>,

    /// Only show runs with this status (repeatable)
    #[arg(long = "status")]
    statuses: Vec<String>,

    /// Only show runs from this project (repeatable)
    #[arg(long = "project")]
    projects: Vec<String>,

    /// Only show runs in this environment (repeatable)
    #[arg(long = "environment")]
    environments: Vec<String>,

    /// Only show runs of this job (repeatable)
    #[arg(long = "job")]
    jobs: Vec<String>,

    #[arg(long)]
    page_size: Option<usize>,

    /// Safety limit on pages scanned per day
    #[arg(long)]
    max_pages: Option<usize>,
}

impl RunsArgs {
    fn filters(&self) -> RunFilter {
        RunFilter {
            statuses: self.statuses.clone(),
            projects: self.projects.clone(),
            environments: self.environments.clone(),
            jobs: self.jobs.clone(),
        }
    }
}

impl Cli {
    fn overrides(&self, args: &RunsArgs) -> Overrides {
        Overrides {
            token: args.token.clone(),
            account_id: args.account_id.clone(),
            base_url: args.base_url.clone(),
            page_size: args.page_size,
            max_pages: args.max_pages,
            format: self.format,
            pretty: self.pretty,
        }
    }

    async fn execute_runs(&self, args: &RunsArgs) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let settings = Settings::resolve(config, self.overrides(args))?;

        let range = DateRange::resolve(args.start, args.end, Utc::now().date_naive())?;
        let state = DashboardState::new(range, args.filters());

        info!(
            "Collecting dbt Cloud runs for account {} ({} to {})",
            settings.account_id, range.start, range.end
        );

        let mut provider = DbtCloudProvider::new(&settings)?;
        let report = provider.collect_report(&range).await?;
        let state = state.with_fetch(report);

        match (&self.output, settings.format) {
            (None, OutputFormat::Summary) => print_dashboard(&state),
            (None, format) => {
                let mut stdout = std::io::stdout().lock();
                export_dashboard(&state, format, settings.pretty, &mut stdout)?;
            }
            (Some(output_path), format) => {
                let mut file = std::fs::File::create(output_path)?;
                export_dashboard(&state, format, settings.pretty, &mut file)?;
                info!("Dashboard written to: {}", output_path.display());
            }
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Runs(args) => self.execute_runs(args).await,
        }
    }
}
