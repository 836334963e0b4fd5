use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright_green, bright_yellow, section_title};

/// Spinner tracking the three phases of building a run report
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_fetching_runs(days: usize) -> Self {
        eprintln!("{}", section_title("⚙️", "Phases"));
        let pb = create_spinner(
            bright_yellow(format!("Phase 1/3: Fetching runs for {days} day(s)")).to_string(),
        );
        Self { pb }
    }

    pub fn set_day(&self, day: usize, days: usize, date: chrono::NaiveDate) {
        self.pb.set_message(
            bright_yellow(format!("Phase 1/3: Fetching runs for {date} ({day}/{days})"))
                .to_string(),
        );
    }

    pub fn finish_runs_start_definitions(self, run_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/3: Fetched {run_count} runs ✓")).to_string(),
        );
        let pb = create_spinner(
            bright_yellow("Phase 2/3: Fetching jobs, projects and environments").to_string(),
        );
        Self { pb }
    }

    pub fn finish_definitions_start_enrichment(self) -> Self {
        self.pb
            .finish_with_message(bright_green("Phase 2/3: Fetched definitions ✓").to_string());
        let pb = create_spinner(bright_yellow("Phase 3/3: Enriching run data").to_string());
        Self { pb }
    }

    pub fn finish_enrichment(self) {
        self.pb
            .finish_with_message(bright_green("Phase 3/3: Runs enriched ✓").to_string());
        eprintln!();
    }

    /// Stops the spinner after a fatal error, leaving the message in place.
    pub fn abandon(self, message: &str) {
        self.pb.abandon_with_message(message.to_string());
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
