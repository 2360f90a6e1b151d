//! City timing dataset loading.
//!
//! The dataset is fetched once at startup. Transient fetch failures are
//! retried with exponential backoff; a document that does not parse is not.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::models::CityTimingRecord;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to fetch {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
        retryable: bool,
    },

    #[error("Failed to parse city dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

impl DatasetError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DatasetError::Fetch { retryable: true, .. })
    }
}

/// Where the dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Url(String),
    File(PathBuf),
}

impl FromStr for DatasetSource {
    type Err = std::convert::Infallible;

    /// `http://` and `https://` values are URLs; anything else is a path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Self::Url(s.to_string()))
        } else {
            Ok(Self::File(PathBuf::from(s)))
        }
    }
}

/// Retrieves the raw dataset bytes.
#[async_trait]
pub trait DatasetFetcher: Send + Sync {
    /// Human-readable source, for logs and errors.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<u8>, DatasetError>;
}

/// Fetches the dataset over HTTP.
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DatasetError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DatasetError::Fetch {
                source_name: url.clone(),
                message: format!("Failed to build HTTP client: {}", e),
                retryable: false,
            })?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl DatasetFetcher for HttpFetcher {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<u8>, DatasetError> {
        let fail = |message: String, retryable: bool| DatasetError::Fetch {
            source_name: self.url.clone(),
            message,
            retryable,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| fail(e.to_string(), true))?;

        let status = response.status();
        if !status.is_success() {
            let retryable = status.is_server_error() || status.as_u16() == 429;
            return Err(fail(format!("HTTP {}", status), retryable));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| fail(format!("Failed to read body: {}", e), true))?;
        Ok(body.to_vec())
    }
}

/// Reads the dataset from disk.
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetFetcher for FileFetcher {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<u8>, DatasetError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| DatasetError::Fetch {
                source_name: self.describe(),
                message: e.to_string(),
                retryable: false,
            })
    }
}

/// Build the fetcher for `source`; relative paths resolve against `base_dir`.
pub fn fetcher_for(
    source: &DatasetSource,
    base_dir: &Path,
    timeout: Duration,
) -> Result<Box<dyn DatasetFetcher>, DatasetError> {
    Ok(match source {
        DatasetSource::Url(url) => Box::new(HttpFetcher::new(url.clone(), timeout)?),
        DatasetSource::File(path) => Box::new(FileFetcher::new(base_dir.join(path))),
    })
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first try
    pub max_retries: u32,
    /// Delay before the first retry (doubles with each retry)
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
        }
    }
}

/// Fetch, retrying retryable failures according to `policy`.
pub async fn fetch_with_retry(
    fetcher: &dyn DatasetFetcher,
    policy: &RetryPolicy,
) -> Result<Vec<u8>, DatasetError> {
    let mut delay = policy.initial_delay;
    let mut last_error = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        match fetcher.fetch().await {
            Ok(bytes) => {
                log::info!(
                    "Fetched {} byte(s) from {} (attempt {})",
                    bytes.len(),
                    fetcher.describe(),
                    attempt + 1
                );
                return Ok(bytes);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                log::warn!("Attempt {} failed: {}; retrying", attempt + 1, e);
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| DatasetError::Fetch {
        source_name: fetcher.describe(),
        message: "Max retries exceeded with no error captured".to_string(),
        retryable: false,
    }))
}

/// Decode the `[{ NAME, STATE, LON, LAT, ECLIPSE }]` document.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<CityTimingRecord>, DatasetError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Fetch and decode the city timing dataset.
pub async fn load_city_records(
    fetcher: &dyn DatasetFetcher,
    policy: &RetryPolicy,
) -> Result<Vec<CityTimingRecord>, DatasetError> {
    let bytes = fetch_with_retry(fetcher, policy).await?;
    let records = parse_records(&bytes)?;
    log::info!("Loaded {} city record(s) from {}", records.len(), fetcher.describe());
    Ok(records)
}
