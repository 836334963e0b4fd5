mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::export_dashboard;
pub use progress::PhaseProgress;
use styling::{dim, magenta_bold};
pub use summary::print_dashboard;

/// Prints the `dbtlens` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔭 dbtlens"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("dbt Cloud Run Monitor")
    );
}
