//! Metadata resolution through the search backend and service pages.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::page_title::extract_page_title;
use super::types::TrackMetadata;
use crate::backend::{BackendAdapter, YtDlpBackend};
use crate::config::{HttpConfig, SecondaryConfig};
use crate::error::{require_success, AcquisitionError};
use crate::fetch::HttpFetcher;
use crate::metrics;
use crate::supervisor::ProcessRunner;

/// Source of a human track title for a service URL.
///
/// The fallback router depends on this rather than on the resolver so it
/// can be tested with a stub.
#[async_trait]
pub trait TitleLookup: Send + Sync {
    /// Returns the page's track title, or `None` when it cannot be found.
    async fn resolve_title_from_url(&self, url: &str) -> Option<String>;
}

/// Resolves track metadata without downloading audio.
pub struct MetadataResolver {
    runner: Arc<dyn ProcessRunner>,
    fetcher: Arc<dyn HttpFetcher>,
    backend: YtDlpBackend,
    metadata_timeout: Duration,
    page_timeout: Duration,
    branding_suffix: String,
}

impl MetadataResolver {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        fetcher: Arc<dyn HttpFetcher>,
        backend: YtDlpBackend,
        secondary: &SecondaryConfig,
        http: &HttpConfig,
    ) -> Self {
        Self {
            runner,
            fetcher,
            backend,
            metadata_timeout: secondary.metadata_timeout(),
            page_timeout: http.page_timeout(),
            branding_suffix: http.branding_suffix.clone(),
        }
    }

    /// Looks up the first search hit for `query` in metadata-only mode.
    pub async fn resolve_by_query(&self, query: &str) -> Result<TrackMetadata, AcquisitionError> {
        info!(query, "Resolving metadata");

        let command = self.backend.search_command(query);
        let is_rate_limited = |line: &str| self.backend.is_rate_limit_signal(line);
        let outcome = self
            .runner
            .run(&command, self.metadata_timeout, &is_rate_limited)
            .await?;
        metrics::record_backend_run(self.backend.kind(), outcome.label());

        let exit = require_success(self.backend.kind(), outcome)?;
        let metadata = self.backend.parse_metadata(&exit.lines).map_err(|e| {
            warn!(query, error = %e, "Search returned unparseable metadata");
            AcquisitionError::MetadataUnparseable(e)
        })?;

        info!(
            artist = metadata.artist(),
            title = metadata.title(),
            source = metadata.source_url(),
            cover = metadata.selected_thumbnail_url().unwrap_or("-"),
            "Found track"
        );
        Ok(metadata)
    }
}

#[async_trait]
impl TitleLookup for MetadataResolver {
    /// Fetches the page and probes it for a title; any failure is `None`.
    async fn resolve_title_from_url(&self, url: &str) -> Option<String> {
        debug!(url, "Fetching service page for track title");

        let html = match self.fetcher.fetch_text(url, self.page_timeout).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url, error = %e, "Could not fetch service page");
                return None;
            }
        };

        match extract_page_title(&html, &self.branding_suffix) {
            Some(title) => {
                info!(url, title = %title, "Found track title");
                Some(title)
            }
            None => {
                warn!(url, "No title found on service page");
                None
            }
        }
    }
}
