use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::auth::Token;
use crate::error::{DbtLensError, Result};
use crate::providers::dbt_cloud::types::Page;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// REST client for one dbt Cloud account (API v2).
///
/// Requests are issued one at a time; nothing is retried.
pub struct DbtCloudClient {
    client: Client,
    account_url: Url,
    token: Token,
}

impl DbtCloudClient {
    pub fn new(base_url: &str, account_id: &str, token: Token, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(concat!("dbtlens/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DbtLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        // A trailing slash keeps any path prefix of the base URL when joining
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        let account_url = Url::parse(&base)
            .map_err(|e| DbtLensError::Config(format!("Invalid base URL: {e}")))?
            .join(&format!("api/v2/accounts/{account_id}/"))
            .map_err(|e| DbtLensError::Config(format!("Invalid account URL: {e}")))?;

        Ok(Self {
            client,
            account_url,
            token,
        })
    }

    pub fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.token.as_str())
    }

    /// Resolves a collection name such as `runs` to its account-scoped URL.
    pub fn endpoint_url(&self, collection: &str) -> Result<Url> {
        self.account_url
            .join(&format!("{collection}/"))
            .map_err(|e| DbtLensError::Config(format!("Invalid endpoint URL: {e}")))
    }

    /// Fetches a single page of a list endpoint.
    ///
    /// Transport failures, non-2xx responses and undecodable bodies map to
    /// the corresponding [`DbtLensError`] variants and are logged here.
    pub(super) async fn get_page<T>(
        &self,
        collection: &str,
        params: &[(&str, String)],
    ) -> Result<Page<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint_url(collection)?;
        debug!("GET {url} {params:?}");

        let response = self
            .auth_request(self.client.get(url.clone()).query(params))
            .send()
            .await
            .inspect_err(|e| error!("Error making API request to {url}: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .inspect_err(|e| error!("Error reading response from {url}: {e}"))?;

        if !status.is_success() {
            let body = describe_error_body(&body);
            error!("HTTP error occurred: status {status} from {url}: {body}");
            return Err(DbtLensError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| {
            error!("Error decoding JSON response from {url}: {source}");
            DbtLensError::Decode {
                url: url.to_string(),
                source,
            }
        })
    }
}

/// Pretty-prints JSON error bodies; anything else is passed through as trimmed text.
fn describe_error_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.trim().to_string())
}
