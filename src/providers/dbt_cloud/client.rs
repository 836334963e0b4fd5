mod core;
mod pagination;
mod runs;

pub use self::core::{DbtCloudClient, DEFAULT_TIMEOUT_SECONDS};
pub use pagination::DEFAULT_PAGE_SIZE;
pub use runs::{ScanOutcome, DEFAULT_MAX_PAGES};
