use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Token;
use crate::error::DbtLensError;

pub const DEFAULT_BASE_URL: &str = "https://au.dbt.com";

/// Value shipped in the sample `.env` files; treated the same as a missing id.
const PLACEHOLDER_ACCOUNT_ID: &str = "YOUR_NUMERIC_ACCOUNT_ID_HERE";

/// Configuration file structure for dbtlens.
///
/// Every field is optional; command-line flags and environment variables
/// take precedence over anything set here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub dbt_cloud: DbtCloudConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbtCloudConfig {
    /// dbt Cloud API token
    pub token: Option<String>,

    /// Numeric dbt Cloud account id
    pub account_id: Option<String>,

    /// Regional dbt Cloud URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Runs requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Safety limit on pages scanned per day
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheConfig {
    #[serde(default = "default_definitions_ttl_secs")]
    pub definitions_ttl_secs: u64,

    #[serde(default = "default_runs_ttl_secs")]
    pub runs_ttl_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    Csv,
}

impl Default for DbtCloudConfig {
    fn default() -> Self {
        Self {
            token: None,
            account_id: None,
            base_url: default_base_url(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            definitions_ttl_secs: default_definitions_ttl_secs(),
            runs_ttl_secs: default_runs_ttl_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> usize {
    crate::providers::DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> usize {
    crate::providers::DEFAULT_MAX_PAGES
}

fn default_timeout_secs() -> u64 {
    crate::providers::DEFAULT_TIMEOUT_SECONDS
}

fn default_definitions_ttl_secs() -> u64 {
    crate::providers::DEFINITIONS_TTL.as_secs()
}

fn default_runs_ttl_secs() -> u64 {
    crate::providers::RUNS_TTL.as_secs()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./dbtlens.toml
    /// 3. ./dbtlens.json
    /// 4. ./dbtlens.yaml
    /// 5. ./dbtlens.yml
    /// 6. `<config dir>/dbtlens/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["dbtlens.toml", "dbtlens.json", "dbtlens.yaml", "dbtlens.yml"]
            .into_iter()
            .map(PathBuf::from)
            .chain(user_config_file());

        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dbtlens").join("config.toml"))
}

/// Values supplied on the command line (or through their environment variables).
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub token: Option<String>,
    pub account_id: Option<String>,
    pub base_url: Option<String>,
    pub page_size: Option<usize>,
    pub max_pages: Option<usize>,
    pub format: Option<OutputFormat>,
    pub pretty: bool,
}

/// Fully resolved and validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: Token,
    pub account_id: String,
    pub base_url: String,
    pub page_size: usize,
    pub max_pages: usize,
    pub timeout: Duration,
    pub definitions_ttl: Duration,
    pub runs_ttl: Duration,
    pub format: OutputFormat,
    pub pretty: bool,
}

impl Settings {
    /// Merges overrides onto the file configuration and validates the result.
    pub fn resolve(config: Config, overrides: Overrides) -> crate::error::Result<Self> {
        let token = overrides
            .token
            .or(config.dbt_cloud.token)
            .map(Token::from)
            .filter(|token| !token.is_placeholder())
            .ok_or_else(|| {
                DbtLensError::Config(
                    "API token not set. Set DBT_CLOUD_API_TOKEN or pass --token.".to_string(),
                )
            })?;

        let account_id = overrides
            .account_id
            .or(config.dbt_cloud.account_id)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && id != PLACEHOLDER_ACCOUNT_ID)
            .ok_or_else(|| {
                DbtLensError::Config(
                    "Account ID not set. Set DBT_CLOUD_ACCOUNT_ID or pass --account-id."
                        .to_string(),
                )
            })?;

        if !account_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(DbtLensError::Config(format!(
                "Account ID '{account_id}' is not valid. It must contain only numbers."
            )));
        }

        let base_url = overrides
            .base_url
            .unwrap_or(config.dbt_cloud.base_url)
            .trim()
            .trim_end_matches('/')
            .to_string();

        if base_url.is_empty() {
            return Err(DbtLensError::Config("Base URL not set or empty.".to_string()));
        }
        url::Url::parse(&base_url)
            .map_err(|e| DbtLensError::Config(format!("Invalid base URL '{base_url}': {e}")))?;

        let page_size = overrides.page_size.unwrap_or(config.dbt_cloud.page_size);
        let max_pages = overrides.max_pages.unwrap_or(config.dbt_cloud.max_pages);
        if page_size == 0 || max_pages == 0 {
            return Err(DbtLensError::Config(
                "Page size and max pages must be positive.".to_string(),
            ));
        }

        if config.dbt_cloud.timeout_secs == 0 {
            return Err(DbtLensError::Config(
                "Request timeout must be at least one second.".to_string(),
            ));
        }

        Ok(Self {
            token,
            account_id,
            base_url,
            page_size,
            max_pages,
            timeout: Duration::from_secs(config.dbt_cloud.timeout_secs),
            definitions_ttl: Duration::from_secs(config.cache.definitions_ttl_secs),
            runs_ttl: Duration::from_secs(config.cache.runs_ttl_secs),
            format: overrides.format.unwrap_or(config.output.format),
            pretty: overrides.pretty || config.output.pretty,
        })
    }
}
