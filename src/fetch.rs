//! HTTP(S) and S3 artifact download.
//!
//! Non-git remote sources are fetched as a single file into the parse's
//! temporary directory. Archives are stored as downloaded.

use crate::config::FetchOptions;
use crate::err;
use crate::error::{Result, TfInputsError};
use crate::git::redact;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name used when the URL path has no usable last segment.
const DEFAULT_FILE_NAME: &str = "main.tf";

/// Retry policy for transient HTTP failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay_ms: 500,
            backoff_multiplier: 2.0,
        }
    }
}

/// Downloads module artifacts over HTTP.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    options: FetchOptions,
    retry: RetryConfig,
}

impl Fetcher {
    /// Create a fetcher from the fetch options.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the HTTP client cannot be built.
    pub fn new(options: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .user_agent(concat!("tfinputs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TfInputsError::internal(format!("failed to build HTTP client: {e}"), file!(), line!()))?;

        Ok(Self {
            client,
            options: options.clone(),
            retry: RetryConfig::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// HTTPS URL of an S3 object.
    ///
    /// Uses the configured path-style endpoint when set, the virtual-hosted
    /// AWS endpoint otherwise.
    #[must_use]
    pub fn s3_url(&self, bucket: &str, key: &str, region: Option<&str>) -> String {
        let key = key.trim_start_matches('/');
        match &self.options.s3_endpoint {
            Some(endpoint) => format!("{}/{bucket}/{key}", endpoint.trim_end_matches('/')),
            None => match region {
                Some(region) => format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"),
                None => format!("https://{bucket}.s3.amazonaws.com/{key}"),
            },
        }
    }

    /// Download `url` into `dir` and return the written file.
    ///
    /// # Errors
    ///
    /// Returns `Fetch` on transport failures or non-success statuses, and
    /// `Io` if the file cannot be written.
    pub async fn fetch_into(&self, url: &str, dir: &Path) -> Result<PathBuf> {
        let shown = redact(url, None);
        tracing::info!(url = %shown, "Fetching module artifact");

        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(|e| {
            err!(Fetch {
                url: shown.clone(),
                message: format!("failed to read response body: {}", e.without_url()),
                status_code: None,
            })
        })?;

        let target = dir.join(file_name_for(url));
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| TfInputsError::io(&target, e, file!(), line!()))?;

        tracing::info!(url = %shown, path = %target.display(), bytes = bytes.len(), "Artifact fetched");
        Ok(target)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let shown = redact(url, None);
        let mut attempts = 0;
        let mut delay = self.retry.delay_ms;

        loop {
            attempts += 1;
            let response = self.client.get(url).send().await.map_err(|e| {
                err!(Fetch {
                    url: shown.clone(),
                    message: format!("request failed: {}", e.without_url()),
                    status_code: None,
                })
            })?;

            if response.status().is_success() {
                return Ok(response);
            }

            let status = response.status();
            if (status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS)
                && attempts <= self.retry.max_retries
            {
                tracing::warn!(
                    url = %shown,
                    status = %status,
                    attempt = attempts,
                    delay_ms = delay,
                    "Fetch failed, retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay = (delay as f64 * self.retry.backoff_multiplier) as u64;
                continue;
            }

            return Err(err!(Fetch {
                url: shown,
                message: format!("unexpected status {status}"),
                status_code: Some(status.as_u16()),
            }));
        }
    }
}

/// Last non-empty path segment of `url`, or [`DEFAULT_FILE_NAME`].
fn file_name_for(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}
