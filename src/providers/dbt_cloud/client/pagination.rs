use log::debug;
use serde::de::DeserializeOwned;

use super::core::DbtCloudClient;
use crate::error::Result;
use crate::providers::dbt_cloud::types::{Definitions, Environment, JobDefinition, Project};

pub const DEFAULT_PAGE_SIZE: usize = 100;

impl DbtCloudClient {
    /// Fetches every item of an offset-paginated list endpoint.
    ///
    /// Stops on an empty page, a short page, or once the server-reported
    /// `total_count` has been reached. Any failed page fails the whole listing.
    pub async fn fetch_all<T>(&self, collection: &str, page_size: usize) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut all_items = Vec::new();
        let mut offset = 0;
        let mut page_num = 1;

        loop {
            debug!("Fetching {collection} page {page_num} (offset {offset})");

            let page = self
                .get_page::<T>(
                    collection,
                    &[("limit", page_size.to_string()), ("offset", offset.to_string())],
                )
                .await?;

            let fetched = page.received();
            if fetched == 0 {
                break;
            }

            let total_count = page.total_count();
            all_items.extend(page.into_items());
            offset += fetched;

            if fetched < page_size || total_count.is_some_and(|total| offset >= total) {
                break;
            }

            page_num += 1;
        }

        debug!("Fetched {} {collection}", all_items.len());
        Ok(all_items)
    }

    /// Fetches jobs, projects and environments, one listing after another.
    pub async fn fetch_definitions(&self, page_size: usize) -> Result<Definitions> {
        let jobs: Vec<JobDefinition> = self.fetch_all("jobs", page_size).await?;
        let projects: Vec<Project> = self.fetch_all("projects", page_size).await?;
        let environments: Vec<Environment> = self.fetch_all("environments", page_size).await?;

        Ok(Definitions {
            jobs,
            projects,
            environments,
        })
    }
}
