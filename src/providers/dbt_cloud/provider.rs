use chrono::{NaiveDate, Utc};
use log::{debug, error, info, warn};

use crate::config::Settings;
use crate::dashboard::DateRange;
use crate::error::{DbtLensError, Result};
use crate::output::PhaseProgress;
use crate::report::{FetchWarning, RunReport};

use super::cache::{CacheLookup, TtlCache};
use super::client::{DbtCloudClient, ScanOutcome};
use super::enrichment::{enrich_runs, LookupMaps};
use super::types::{Definitions, Run};

/// A successful scan, in the form kept by the run cache.
#[derive(Debug, Clone)]
struct CachedScan {
    runs: Vec<Run>,
    /// Set when the scan stopped at the page limit
    pages_scanned: Option<usize>,
}

impl CachedScan {
    /// Failed and partial scans are never cached.
    fn from_outcome(outcome: &ScanOutcome) -> Option<Self> {
        match outcome {
            ScanOutcome::Complete(runs) => Some(Self {
                runs: runs.clone(),
                pages_scanned: None,
            }),
            ScanOutcome::Incomplete {
                runs,
                pages_scanned,
            } => Some(Self {
                runs: runs.clone(),
                pages_scanned: Some(*pages_scanned),
            }),
            ScanOutcome::Partial { .. } | ScanOutcome::Failed(_) => None,
        }
    }

    fn into_outcome(self) -> ScanOutcome {
        match self.pages_scanned {
            None => ScanOutcome::Complete(self.runs),
            Some(pages_scanned) => ScanOutcome::Incomplete {
                runs: self.runs,
                pages_scanned,
            },
        }
    }
}

/// Runs collected across a date range, with any non-fatal caveats.
#[derive(Debug, Default)]
pub struct RangeFetch {
    pub runs: Vec<Run>,
    pub warnings: Vec<FetchWarning>,
}

/// dbt Cloud run-history provider.
///
/// Scans the runs feed day by day, resolves job, project and environment
/// names, and memoizes both kinds of fetch for their configured TTLs.
pub struct DbtCloudProvider {
    client: DbtCloudClient,
    account_id: String,
    base_url: String,
    page_size: usize,
    max_pages: usize,
    run_cache: TtlCache<CachedScan>,
    definitions_cache: TtlCache<Definitions>,
}

impl DbtCloudProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the base URL is invalid.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = DbtCloudClient::new(
            &settings.base_url,
            &settings.account_id,
            settings.token.clone(),
            settings.timeout,
        )?;

        Ok(Self {
            client,
            account_id: settings.account_id.clone(),
            base_url: settings.base_url.clone(),
            page_size: settings.page_size,
            max_pages: settings.max_pages,
            run_cache: TtlCache::new("runs", settings.runs_ttl),
            definitions_cache: TtlCache::new("definitions", settings.definitions_ttl),
        })
    }

    /// Scans one day, serving a cached result when it is still fresh.
    pub async fn fetch_day(&mut self, date: NaiveDate) -> ScanOutcome {
        let key = (self.account_id.as_str(), date, self.page_size, self.max_pages);

        match self.run_cache.lookup(&key) {
            CacheLookup::Fresh(cached) => {
                debug!("Using cached runs for {date}");
                return cached.into_outcome();
            }
            CacheLookup::Expired => debug!("Cached runs for {date} expired; refetching"),
            CacheLookup::Absent => {}
        }

        let outcome = self
            .client
            .fetch_runs_for_day(date, self.page_size, self.max_pages)
            .await;
        debug!("Scan for {date} kept {} runs", outcome.runs().len());

        if let Some(cached) = CachedScan::from_outcome(&outcome) {
            self.run_cache.insert(&key, cached);
        }

        outcome
    }

    /// Scans every day in `range`, oldest day first.
    ///
    /// # Errors
    ///
    /// Returns [`DbtLensError::DayFailed`] for the first day on which no page
    /// could be fetched at all. Partial and page-limited days are kept and
    /// reported as warnings.
    pub async fn fetch_range(
        &mut self,
        range: &DateRange,
        progress: Option<&PhaseProgress>,
    ) -> Result<RangeFetch> {
        let days: Vec<NaiveDate> = range.days().collect();
        let mut fetched = RangeFetch::default();

        for (index, date) in days.iter().copied().enumerate() {
            if let Some(progress) = progress {
                progress.set_day(index + 1, days.len(), date);
            }

            match self.fetch_day(date).await {
                ScanOutcome::Complete(runs) => {
                    info!("Found {} runs for {date}", runs.len());
                    fetched.runs.extend(runs);
                }
                ScanOutcome::Incomplete {
                    runs,
                    pages_scanned,
                } => {
                    fetched.warnings.push(FetchWarning::PageLimitReached {
                        date,
                        max_pages: pages_scanned,
                    });
                    fetched.runs.extend(runs);
                }
                ScanOutcome::Partial { runs, error } => {
                    warn!("Keeping {} runs for {date} despite: {error}", runs.len());
                    fetched.warnings.push(FetchWarning::PartialDay {
                        date,
                        runs_kept: runs.len(),
                        reason: error.to_string(),
                    });
                    fetched.runs.extend(runs);
                }
                ScanOutcome::Failed(error) => {
                    error!("Failed to fetch runs for {date}. Stopping.");
                    return Err(DbtLensError::DayFailed {
                        date,
                        source: Box::new(error),
                    });
                }
            }
        }

        info!("Total runs found in range: {}", fetched.runs.len());
        Ok(fetched)
    }

    /// Fetches job, project and environment definitions, cached per account.
    pub async fn fetch_definitions(&mut self) -> Result<Definitions> {
        let key = (self.account_id.as_str(), self.page_size);

        if let CacheLookup::Fresh(definitions) = self.definitions_cache.lookup(&key) {
            debug!("Using cached definitions");
            return Ok(definitions);
        }

        let definitions = self.client.fetch_definitions(self.page_size).await?;
        info!(
            "Fetched {} jobs, {} projects, {} environments",
            definitions.jobs.len(),
            definitions.projects.len(),
            definitions.environments.len()
        );

        self.definitions_cache.insert(&key, definitions.clone());
        Ok(definitions)
    }

    /// Builds an enriched report for `range`.
    ///
    /// Progress is displayed in three phases:
    /// 1. Scanning runs day by day
    /// 2. Fetching job, project and environment definitions
    /// 3. Enriching runs with names
    ///
    /// When definitions cannot be fetched the runs are still returned, labelled
    /// with raw ids, and a warning is attached.
    ///
    /// # Errors
    ///
    /// Returns an error if any day in the range fails outright.
    pub async fn collect_report(&mut self, range: &DateRange) -> Result<RunReport> {
        info!(
            "Fetching runs for account {} from {} to {}",
            self.account_id, range.start, range.end
        );

        let progress = PhaseProgress::start_fetching_runs(range.days().count());

        let fetched = match self.fetch_range(range, Some(&progress)).await {
            Ok(fetched) => fetched,
            Err(e) => {
                progress.abandon("Phase 1/3: Fetching runs failed ✗");
                return Err(e);
            }
        };
        let RangeFetch { runs, mut warnings } = fetched;

        if runs.is_empty() {
            warn!("No runs found for the selected date range");
        }

        let progress = progress.finish_runs_start_definitions(runs.len());

        let lookups = match self.fetch_definitions().await {
            Ok(definitions) => LookupMaps::from_definitions(&definitions),
            Err(e) => {
                error!("Failed to fetch necessary definitions. Cannot enrich data: {e}");
                warnings.push(FetchWarning::DefinitionsUnavailable {
                    reason: e.to_string(),
                });
                LookupMaps::default()
            }
        };

        let progress = progress.finish_definitions_start_enrichment();

        let missing_status = runs.iter().filter(|run| run.status.is_none()).count();
        if missing_status > 0 {
            warnings.push(FetchWarning::MissingStatus {
                runs: missing_status,
            });
        }

        let enriched = enrich_runs(&runs, &lookups);

        progress.finish_enrichment();

        Ok(RunReport {
            account_id: self.account_id.clone(),
            base_url: self.base_url.clone(),
            start_date: range.start,
            end_date: range.end,
            collected_at: Utc::now(),
            runs: enriched,
            warnings,
        })
    }
}
