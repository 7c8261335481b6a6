//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the process runner and HTTP
//! fetcher, so the whole acquisition flow can be tested without the real
//! backends or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use trackfetch_core::testing::{fixtures, MockHttpFetcher, MockProcessRunner};
//!
//! let runner = Arc::new(MockProcessRunner::new());
//! let fetcher = Arc::new(MockHttpFetcher::new());
//!
//! // Script the search call and the download call
//! runner.push_success(vec![&fixtures::ytdlp_json("Believer", "Imagine Dragons", url, &[])]).await;
//! runner.push_success_with_files(vec![], vec![audio_path]).await;
//!
//! let orchestrator = AcquisitionOrchestrator::new(&config, runner, fetcher);
//! ```

mod mock_http_fetcher;
mod mock_process_runner;

pub use mock_http_fetcher::MockHttpFetcher;
pub use mock_process_runner::{MockProcessRunner, RecordedRun};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::config::Config;

    /// A default config writing into `dir`.
    pub fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.output.dir = dir.to_path_buf();
        config.logging.verbose = false;
        config
    }

    /// A yt-dlp `--dump-json` line. Thumbnails are `(url, width, height)`.
    pub fn ytdlp_json(title: &str, artist: &str, url: &str, thumbnails: &[(&str, u32, u32)]) -> String {
        let thumbnails: Vec<serde_json::Value> = thumbnails
            .iter()
            .map(|(url, width, height)| {
                serde_json::json!({ "url": url, "width": width, "height": height })
            })
            .collect();
        serde_json::json!({
            "title": title,
            "artist": artist,
            "duration": 204.4,
            "webpage_url": url,
            "thumbnails": thumbnails,
        })
        .to_string()
    }

    /// spotdl's completion line.
    pub fn spotdl_downloaded_line(artist: &str, title: &str, url: &str) -> String {
        format!("Downloaded \"{} - {}\": {}", artist, title, url)
    }

    /// A minimal service page with an `og:title`.
    pub fn service_page(title: &str) -> String {
        format!(
            "<html><head><meta property=\"og:title\" content=\"{}\"/><title>{} | Spotify</title></head></html>",
            title, title
        )
    }
}
