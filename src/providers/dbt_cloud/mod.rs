mod cache;
mod client;
mod enrichment;
mod provider;
mod types;
mod window;

pub use cache::{DEFINITIONS_TTL, RUNS_TTL};
pub use client::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECONDS};
pub use provider::DbtCloudProvider;
