use chrono::NaiveDate;
use log::{debug, error, info, warn};

use super::core::DbtCloudClient;
use crate::error::{DbtLensError, Result};
use crate::providers::dbt_cloud::types::{Page, Run};
use crate::providers::dbt_cloud::window::{TimeWindow, WindowPosition};

pub const DEFAULT_MAX_PAGES: usize = 20;

/// Result of scanning the runs feed for one day.
///
/// An empty `Complete` means the day genuinely had no runs; it is never used
/// to report a failure.
#[derive(Debug)]
pub enum ScanOutcome {
    /// A definitive stop condition was reached
    Complete(Vec<Run>),
    /// The page limit was hit first; older matching runs may be missing
    Incomplete { runs: Vec<Run>, pages_scanned: usize },
    /// Some pages were read before a request failed
    Partial { runs: Vec<Run>, error: DbtLensError },
    /// The first request failed; nothing is known about the day
    Failed(DbtLensError),
}

impl ScanOutcome {
    pub fn runs(&self) -> &[Run] {
        match self {
            Self::Complete(runs) | Self::Incomplete { runs, .. } | Self::Partial { runs, .. } => {
                runs
            }
            Self::Failed(_) => &[],
        }
    }
}

impl DbtCloudClient {
    async fn fetch_runs_page(&self, offset: usize, page_size: usize) -> Result<Page<Run>> {
        self.get_page(
            "runs",
            &[
                ("limit", page_size.to_string()),
                ("offset", offset.to_string()),
                ("order_by", "-created_at".to_string()),
            ],
        )
        .await
    }

    /// Collects the runs created during `target_date` (UTC).
    ///
    /// Walks the feed newest-first and stops as soon as a run older than the
    /// day shows up, relying on the API honouring `order_by=-created_at`.
    /// Runs without a parseable `created_at` are skipped.
    pub async fn fetch_runs_for_day(
        &self,
        target_date: NaiveDate,
        page_size: usize,
        max_pages: usize,
    ) -> ScanOutcome {
        let window = TimeWindow::for_day(target_date);
        let mut runs = Vec::new();
        let mut offset = 0;

        info!("Fetching runs created on {target_date} (UTC)...");

        for page_num in 1..=max_pages {
            debug!("Fetching runs page {page_num}/{max_pages} (offset {offset})");

            let page = match self.fetch_runs_page(offset, page_size).await {
                Ok(page) => page,
                Err(error) if page_num == 1 => {
                    error!("Failed to fetch runs for {target_date}: {error}");
                    return ScanOutcome::Failed(error);
                }
                Err(error) => {
                    warn!(
                        "API request failed during pagination; keeping {} runs found so far for {target_date}",
                        runs.len()
                    );
                    return ScanOutcome::Partial { runs, error };
                }
            };

            let fetched = page.received();
            if fetched == 0 {
                debug!("No more runs in API history");
                return ScanOutcome::Complete(runs);
            }

            let total_count = page.total_count();
            let mut reached_older = false;

            for run in page.into_items() {
                let Some(created_at) = run.created_at_utc() else {
                    debug!("Skipping run {} with missing or invalid created_at", run.id);
                    continue;
                };

                match window.classify(created_at) {
                    WindowPosition::Within => runs.push(run),
                    WindowPosition::Before => {
                        debug!("Run {} ({created_at}) predates {target_date}; stopping", run.id);
                        reached_older = true;
                        break;
                    }
                    WindowPosition::After => {}
                }
            }

            offset += fetched;

            if reached_older
                || fetched < page_size
                || total_count.is_some_and(|total| offset >= total)
            {
                info!("Found {} runs for {target_date}", runs.len());
                return ScanOutcome::Complete(runs);
            }
        }

        warn!(
            "Stopped fetching after checking {max_pages} pages for {target_date}. Results might be incomplete."
        );
        ScanOutcome::Incomplete {
            runs,
            pages_scanned: max_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;
    use mockito::{Matcher, Mock, ServerGuard};
    use serde_json::json;
    use std::time::Duration;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn client_for(server: &ServerGuard) -> DbtCloudClient {
        DbtCloudClient::new(&server.url(), "42", Token::from("t"), Duration::from_secs(5)).unwrap()
    }

    fn runs_body(runs: &[(u64, &str)], total_count: Option<usize>) -> String {
        let data: Vec<_> = runs
            .iter()
            .map(|(id, created_at)| json!({"id": id, "created_at": created_at, "status": 10}))
            .collect();
        let mut body = json!({ "data": data });
        if let Some(total) = total_count {
            body["extra"] = json!({"pagination": {"total_count": total}});
        }
        body.to_string()
    }

    async fn mock_runs_page(
        server: &mut ServerGuard,
        offset: usize,
        limit: usize,
        body: String,
        expected_hits: usize,
    ) -> Mock {
        server
            .mock("GET", "/api/v2/accounts/42/runs/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), limit.to_string()),
                Matcher::UrlEncoded("offset".into(), offset.to_string()),
                Matcher::UrlEncoded("order_by".into(), "-created_at".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(expected_hits)
            .create_async()
            .await
    }

    fn ids(runs: &[Run]) -> Vec<u64> {
        runs.iter().map(|run| run.id).collect()
    }

    #[tokio::test]
    async fn stops_after_page_containing_older_run() {
        let mut server = mockito::Server::new_async().await;
        let page_1 = mock_runs_page(
            &mut server,
            0,
            2,
            runs_body(&[(4, "2024-01-15T23:00:00Z"), (3, "2024-01-15T01:00:00Z")], None),
            1,
        )
        .await;
        let page_2 = mock_runs_page(
            &mut server,
            2,
            2,
            runs_body(&[(2, "2024-01-14T23:00:00Z"), (1, "2024-01-14T12:00:00Z")], None),
            1,
        )
        .await;
        let page_3 = mock_runs_page(&mut server, 4, 2, runs_body(&[], None), 0).await;

        let outcome = client_for(&server)
            .fetch_runs_for_day(day(2024, 1, 15), 2, DEFAULT_MAX_PAGES)
            .await;

        page_1.assert_async().await;
        page_2.assert_async().await;
        page_3.assert_async().await;
        assert!(matches!(&outcome, ScanOutcome::Complete(_)));
        assert_eq!(ids(outcome.runs()), vec![4, 3]);
    }

    #[tokio::test]
    async fn stops_on_first_page_when_it_holds_an_older_run() {
        let mut server = mockito::Server::new_async().await;
        let page_1 = mock_runs_page(
            &mut server,
            0,
            2,
            runs_body(&[(3, "2024-01-15T01:00:00Z"), (2, "2024-01-14T23:00:00Z")], None),
            1,
        )
        .await;
        // Would match if scanned, but must never be requested
        let page_2 = mock_runs_page(
            &mut server,
            2,
            2,
            runs_body(&[(1, "2024-01-15T05:00:00Z")], None),
            0,
        )
        .await;

        let outcome = client_for(&server)
            .fetch_runs_for_day(day(2024, 1, 15), 2, DEFAULT_MAX_PAGES)
            .await;

        page_1.assert_async().await;
        page_2.assert_async().await;
        assert_eq!(ids(outcome.runs()), vec![3]);
    }

    #[tokio::test]
    async fn window_boundaries_are_half_open() {
        let mut server = mockito::Server::new_async().await;
        mock_runs_page(
            &mut server,
            0,
            10,
            runs_body(
                &[
                    (3, "2024-01-16T00:00:00Z"),
                    (2, "2024-01-15T00:00:00Z"),
                    (1, "2024-01-14T23:59:59Z"),
                ],
                None,
            ),
            1,
        )
        .await;

        let outcome = client_for(&server)
            .fetch_runs_for_day(day(2024, 1, 15), 10, DEFAULT_MAX_PAGES)
            .await;

        assert_eq!(ids(outcome.runs()), vec![2]);
    }

    #[tokio::test]
    async fn skips_newer_and_unparseable_runs() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "data": [
                {"id": 5, "created_at": "2024-01-16T08:00:00Z"},
                {"id": 4, "created_at": "not a date"},
                {"id": 3},
                {"id": 2, "created_at": "2024-01-15 10:00:00.000000+00:00"},
            ]
        })
        .to_string();
        mock_runs_page(&mut server, 0, 10, body, 1).await;

        let outcome = client_for(&server)
            .fetch_runs_for_day(day(2024, 1, 15), 10, DEFAULT_MAX_PAGES)
            .await;

        assert!(matches!(&outcome, ScanOutcome::Complete(_)));
        assert_eq!(ids(outcome.runs()), vec![2]);
    }

    #[tokio::test]
    async fn malformed_records_are_skipped_without_losing_the_page() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "data": [
                {"id": 2, "created_at": "2024-01-15T10:00:00Z", "status": 10},
                {"id": 1, "created_at": 1705312800},
                {"created_at": "2024-01-15T08:00:00Z", "status": 20},
            ]
        })
        .to_string();
        let page_1 = mock_runs_page(&mut server, 0, 3, body, 1).await;
        // Offsets count every received record, decodable or not
        let page_2 = mock_runs_page(&mut server, 3, 3, runs_body(&[], None), 1).await;

        let outcome = client_for(&server)
            .fetch_runs_for_day(day(2024, 1, 15), 3, DEFAULT_MAX_PAGES)
            .await;

        page_1.assert_async().await;
        page_2.assert_async().await;
        assert!(matches!(&outcome, ScanOutcome::Complete(_)));
        assert_eq!(ids(outcome.runs()), vec![2]);
    }

    #[tokio::test]
    async fn empty_collection_is_a_complete_empty_result() {
        let mut server = mockito::Server::new_async().await;
        mock_runs_page(&mut server, 0, 100, runs_body(&[], Some(0)), 1).await;

        let outcome = client_for(&server)
            .fetch_runs_for_day(day(2024, 1, 15), 100, DEFAULT_MAX_PAGES)
            .await;

        match outcome {
            ScanOutcome::Complete(runs) => assert!(runs.is_empty()),
            other => panic!("expected complete outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stops_when_total_count_is_reached() {
        let mut server = mockito::Server::new_async().await;
        mock_runs_page(
            &mut server,
            0,
            2,
            runs_body(&[(2, "2024-01-15T09:00:00Z"), (1, "2024-01-15T08:00:00Z")], Some(2)),
            1,
        )
        .await;
        let never = mock_runs_page(&mut server, 2, 2, runs_body(&[], None), 0).await;

        let outcome = client_for(&server)
            .fetch_runs_for_day(day(2024, 1, 15), 2, DEFAULT_MAX_PAGES)
            .await;

        never.assert_async().await;
        assert!(matches!(&outcome, ScanOutcome::Complete(_)));
        assert_eq!(ids(outcome.runs()), vec![2, 1]);
    }

    #[tokio::test]
    async fn safety_bound_returns_incomplete_accumulation() {
        let mut server = mockito::Server::new_async().await;
        mock_runs_page(
            &mut server,
            0,
            1,
            runs_body(&[(3, "2024-01-15T09:00:00Z")], None),
            1,
        )
        .await;
        mock_runs_page(
            &mut server,
            1,
            1,
            runs_body(&[(2, "2024-01-15T08:00:00Z")], None),
            1,
        )
        .await;
        let beyond_limit = mock_runs_page(
            &mut server,
            2,
            1,
            runs_body(&[(1, "2024-01-15T07:00:00Z")], None),
            0,
        )
        .await;

        let outcome = client_for(&server)
            .fetch_runs_for_day(day(2024, 1, 15), 1, 2)
            .await;

        beyond_limit.assert_async().await;
        match outcome {
            ScanOutcome::Incomplete {
                runs,
                pages_scanned,
            } => {
                assert_eq!(ids(&runs), vec![3, 2]);
                assert_eq!(pages_scanned, 2);
            }
            other => panic!("expected incomplete outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failure_after_first_page_is_partial() {
        let mut server = mockito::Server::new_async().await;
        mock_runs_page(
            &mut server,
            0,
            1,
            runs_body(&[(2, "2024-01-15T09:00:00Z")], None),
            1,
        )
        .await;
        server
            .mock("GET", "/api/v2/accounts/42/runs/")
            .match_query(Matcher::UrlEncoded("offset".into(), "1".into()))
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let outcome = client_for(&server)
            .fetch_runs_for_day(day(2024, 1, 15), 1, DEFAULT_MAX_PAGES)
            .await;

        match outcome {
            ScanOutcome::Partial { runs, error } => {
                assert_eq!(ids(&runs), vec![2]);
                assert!(matches!(error, DbtLensError::HttpStatus { status: 502, .. }));
            }
            other => panic!("expected partial outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_page_transport_failure_is_total_failure() {
        let client = DbtCloudClient::new(
            "http://127.0.0.1:9",
            "42",
            Token::from("t"),
            Duration::from_secs(2),
        )
        .unwrap();

        let outcome = client
            .fetch_runs_for_day(day(2024, 1, 15), 100, DEFAULT_MAX_PAGES)
            .await;

        assert!(matches!(
            outcome,
            ScanOutcome::Failed(DbtLensError::Transport(_))
        ));
        assert!(outcome.runs().is_empty());
    }
}
