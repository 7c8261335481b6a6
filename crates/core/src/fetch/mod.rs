//! HTTP access for page scraping and cover-art downloads.

mod reqwest_fetcher;

pub use reqwest_fetcher::ReqwestFetcher;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// No response within the time budget.
    #[error("Request to {url} timed out after {timeout_secs} seconds")]
    Timeout { url: String, timeout_secs: u64 },

    /// Writing the downloaded body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Minimal HTTP client surface used by the resolver and orchestrator.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GETs `url` and returns the body as text (invalid UTF-8 replaced).
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;

    /// GETs `url` and writes the body to `dest`, returning the byte count.
    async fn download(&self, url: &str, dest: &Path, timeout: Duration)
        -> Result<u64, FetchError>;
}
