//! Mock HTTP fetcher for testing.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::fetch::{FetchError, HttpFetcher};

/// Mock implementation of the HttpFetcher trait.
///
/// Serves configured pages and binary bodies by exact URL. Unknown URLs
/// answer 404, and URLs marked with [`MockHttpFetcher::fail_url`] answer
/// with the given status. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockHttpFetcher {
    pages: Arc<RwLock<HashMap<String, String>>>,
    bodies: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failures: Arc<RwLock<HashMap<String, u16>>>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl MockHttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url` from `fetch_text`.
    pub async fn set_page(&self, url: &str, html: &str) {
        self.pages
            .write()
            .await
            .insert(url.to_string(), html.to_string());
    }

    /// Serve `body` for `url` from `download`.
    pub async fn set_body(&self, url: &str, body: &[u8]) {
        self.bodies
            .write()
            .await
            .insert(url.to_string(), body.to_vec());
    }

    /// Answer every request for `url` with `status`.
    pub async fn fail_url(&self, url: &str, status: u16) {
        self.failures.write().await.insert(url.to_string(), status);
    }

    /// URLs requested so far, in order.
    pub async fn recorded_requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    async fn check(&self, url: &str) -> Result<(), FetchError> {
        self.requests.write().await.push(url.to_string());
        match self.failures.read().await.get(url) {
            Some(&status) => Err(FetchError::Status {
                status,
                url: url.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn not_found(url: &str) -> FetchError {
    FetchError::Status {
        status: 404,
        url: url.to_string(),
    }
}

#[async_trait]
impl HttpFetcher for MockHttpFetcher {
    async fn fetch_text(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        self.check(url).await?;
        self.pages
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| not_found(url))
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        _timeout: Duration,
    ) -> Result<u64, FetchError> {
        self.check(url).await?;
        let body = self
            .bodies
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| not_found(url))?;
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}
