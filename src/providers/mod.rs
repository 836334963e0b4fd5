mod dbt_cloud;

pub use dbt_cloud::{
    DbtCloudProvider, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECONDS,
    DEFINITIONS_TTL, RUNS_TTL,
};
