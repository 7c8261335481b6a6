//! `reqwest`-backed [`HttpFetcher`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use super::{FetchError, HttpFetcher};

/// HTTP client sending a browser-like User-Agent.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Create a new fetcher with the given User-Agent.
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<Response, FetchError> {
        debug!(url, timeout_secs = timeout.as_secs(), "HTTP GET");

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, url, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

fn map_send_error(err: reqwest::Error, url: &str, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_secs: timeout.as_secs(),
        }
    } else {
        FetchError::HttpError(err)
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self.get(url, timeout).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_send_error(e, url, timeout))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<u64, FetchError> {
        let response = self.get(url, timeout).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_send_error(e, url, timeout))?;
        tokio::fs::write(dest, &bytes).await?;
        debug!(url, dest = %dest.display(), bytes = bytes.len(), "Saved download");
        Ok(bytes.len() as u64)
    }
}
