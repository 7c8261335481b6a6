//! Acquisition lifecycle integration tests.
//!
//! These tests drive the orchestrator end to end through the mock process
//! runner and HTTP fetcher:
//! request -> classify -> backend run -> routing -> [fallback ->] result

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use trackfetch_core::{
    testing::{fixtures, MockHttpFetcher, MockProcessRunner},
    AcquisitionOrchestrator, AcquisitionRequest, BackendKind, BackendOutcome,
};

const SERVICE_URL: &str = "https://open.spotify.com/track/7qiZfU4dY1lWllzX7mPBI3";
const BELIEVER_URL: &str = "https://www.youtube.com/watch?v=7wtfhZwyrcc";
const SHAPE_URL: &str = "https://www.youtube.com/watch?v=JGwWNGJdvx8";
const COVER_URL: &str = "https://i.ytimg.com/vi_webp/7wtfhZwyrcc/maxresdefault.webp";

/// Test helper owning the mocks and the output directory.
struct TestHarness {
    runner: Arc<MockProcessRunner>,
    fetcher: Arc<MockHttpFetcher>,
    orchestrator: AcquisitionOrchestrator,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let runner = Arc::new(MockProcessRunner::new());
        let fetcher = Arc::new(MockHttpFetcher::new());
        let orchestrator = AcquisitionOrchestrator::new(
            &fixtures::config_in(temp_dir.path()),
            runner.clone(),
            fetcher.clone(),
        );

        Self {
            runner,
            fetcher,
            orchestrator,
            temp_dir,
        }
    }

    fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir().join(name)
    }

    /// Scripts a successful secondary pipeline: search, then download.
    async fn script_secondary(&self, title: &str, artist: &str, url: &str, audio: &str) {
        let json = fixtures::ytdlp_json(
            title,
            artist,
            url,
            &[(COVER_URL, 1280, 720), ("https://i.ytimg.com/vi/x/default.jpg", 120, 90)],
        );
        self.runner.push_success(vec![json.as_str()]).await;
        self.runner
            .push_success_with_files(
                vec!["[ExtractAudio] Destination: file", "[EmbedThumbnail] done"],
                vec![self.path(audio)],
            )
            .await;
    }

    async fn acquire(&self, input: &str) -> trackfetch_core::AcquisitionResult {
        let request = self.orchestrator.classify(input);
        tokio::time::timeout(Duration::from_secs(10), self.orchestrator.acquire(request))
            .await
            .expect("acquire did not terminate")
    }
}

fn output_template(args: &[String]) -> &str {
    let index = args
        .iter()
        .position(|a| a == "--output")
        .expect("no --output argument");
    &args[index + 1]
}

#[tokio::test]
async fn test_free_text_query_downloads_audio_and_cover() {
    let harness = TestHarness::new();
    harness
        .script_secondary(
            "Believer",
            "Imagine Dragons",
            BELIEVER_URL,
            "Imagine Dragons - Believer.mp3",
        )
        .await;
    harness.fetcher.set_body(COVER_URL, b"webp bytes").await;

    let result = harness.acquire("Imagine Dragons Believer").await;

    assert!(result.success, "{}", result.message);
    assert_eq!(
        result.request,
        AcquisitionRequest::SearchQuery("Imagine Dragons Believer".to_string())
    );
    assert_eq!(
        result.audio_path,
        Some(harness.path("Imagine Dragons - Believer.mp3"))
    );
    let cover = harness.path("Imagine Dragons - Believer.webp");
    assert_eq!(result.cover_path, Some(cover.clone()));
    assert_eq!(std::fs::read(&cover).unwrap(), b"webp bytes");
    assert_eq!(result.backend, Some(BackendKind::Secondary));
    assert!(!result.used_fallback);

    let meta = result.metadata.expect("metadata");
    assert_eq!(meta.title(), "Believer");
    assert_eq!(meta.artist(), "Imagine Dragons");
    assert_eq!(meta.duration_secs(), 204);
    assert_eq!(meta.selected_thumbnail_url(), Some(COVER_URL));

    let commands = harness.runner.recorded_commands().await;
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].args_lossy()[0], "ytsearch1:Imagine Dragons Believer");
    let download_args = commands[1].args_lossy();
    assert_eq!(download_args[0], BELIEVER_URL);
    assert!(download_args.contains(&"--no-playlist".to_string()));
}

#[tokio::test]
async fn test_rate_limited_url_falls_back_to_page_title() {
    let harness = TestHarness::new();
    harness
        .runner
        .push_success(vec![
            "Processing query: 7qiZfU4dY1lWllzX7mPBI3",
            "Fetching track metadata",
            "Your application has reached a rate/request limit. Retry will occur after: 86400",
            "Downloaded \"Ed Sheeran - Shape of You\": never printed",
        ])
        .await;
    harness
        .fetcher
        .set_page(SERVICE_URL, &fixtures::service_page("Shape of You"))
        .await;
    harness
        .script_secondary("Shape of You", "Ed Sheeran", SHAPE_URL, "Ed Sheeran - Shape of You.mp3")
        .await;
    harness.fetcher.set_body(COVER_URL, b"cover").await;

    let result = harness.acquire(SERVICE_URL).await;

    assert!(result.success, "{}", result.message);
    assert!(result.used_fallback);
    assert_eq!(result.backend, Some(BackendKind::Secondary));
    assert_eq!(
        result.audio_path,
        Some(harness.path("Ed Sheeran - Shape of You.mp3"))
    );

    let runs = harness.runner.recorded_runs().await;
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0].command.program, PathBuf::from("spotdl"));
    assert_eq!(runs[0].timeout, Duration::from_secs(120));
    assert_eq!(runs[1].command.args_lossy()[0], "ytsearch1:Shape of You");
    assert_eq!(runs[1].timeout, Duration::from_secs(60));
    assert_eq!(runs[2].timeout, Duration::from_secs(300));

    let requests = harness.fetcher.recorded_requests().await;
    assert_eq!(requests, vec![SERVICE_URL.to_string(), COVER_URL.to_string()]);
}

#[tokio::test]
async fn test_fallback_result_follows_secondary_failure() {
    let harness = TestHarness::new();
    harness
        .runner
        .push_success(vec!["one", "two", "rate limit hit"])
        .await;
    harness
        .fetcher
        .set_page(SERVICE_URL, &fixtures::service_page("Shape of You"))
        .await;
    harness
        .runner
        .push_success(vec![fixtures::ytdlp_json("Shape of You", "Ed Sheeran", SHAPE_URL, &[]).as_str()])
        .await;
    harness
        .runner
        .push_outcome(BackendOutcome::Failed {
            code: Some(1),
            lines: vec!["ERROR: [youtube] JGwWNGJdvx8: Video unavailable".to_string()],
        })
        .await;

    let result = harness.acquire(SERVICE_URL).await;

    assert!(!result.success);
    assert!(result.used_fallback);
    assert!(result.audio_path.is_none());
    assert!(result.message.contains("secondary backend failed: exit code 1"));
    assert!(result.message.contains("Video unavailable"));
    assert_eq!(result.metadata.unwrap().title(), "Shape of You");
}

#[tokio::test]
async fn test_rate_limited_without_page_title_gives_up() {
    let harness = TestHarness::new();
    harness
        .runner
        .push_success(vec!["Processing query", "Rate Limit reached"])
        .await;

    let result = harness.acquire(SERVICE_URL).await;

    assert!(!result.success);
    assert!(!result.used_fallback);
    assert!(result
        .message
        .starts_with("Rate limited and could not derive fallback query"));
    assert!(result.message.contains("Rate Limit reached"));
    assert_eq!(harness.runner.recorded_runs().await.len(), 1);
    assert_eq!(
        harness.fetcher.recorded_requests().await,
        vec![SERVICE_URL.to_string()]
    );
}

#[tokio::test]
async fn test_primary_timeout_has_no_fallback() {
    let harness = TestHarness::new();
    harness
        .runner
        .push_outcome(BackendOutcome::Timeout {
            elapsed: Duration::from_secs(120),
            lines: vec!["Processing query".to_string()],
        })
        .await;

    let result = harness.acquire(SERVICE_URL).await;

    assert!(!result.success);
    assert!(!result.used_fallback);
    assert!(result.message.contains("timed out after 120.0s"));
    assert!(result.message.contains("Processing query"));
    assert_eq!(harness.runner.recorded_runs().await.len(), 1);
    assert!(harness.fetcher.recorded_requests().await.is_empty());
}

#[tokio::test]
async fn test_unparseable_metadata_skips_download() {
    let harness = TestHarness::new();
    harness
        .runner
        .push_success(vec!["WARNING: something odd", "{not json"])
        .await;

    let result = harness.acquire("some obscure song").await;

    assert!(!result.success);
    assert!(result.message.starts_with("Could not parse track metadata"));
    assert!(result.metadata.is_none());
    assert_eq!(harness.runner.recorded_runs().await.len(), 1);
}

#[tokio::test]
async fn test_cover_failure_degrades_result() {
    let harness = TestHarness::new();
    harness
        .script_secondary(
            "Believer",
            "Imagine Dragons",
            BELIEVER_URL,
            "Imagine Dragons - Believer.mp3",
        )
        .await;
    harness.fetcher.fail_url(COVER_URL, 503).await;

    let result = harness.acquire("Imagine Dragons Believer").await;

    assert!(result.success, "{}", result.message);
    assert!(result.audio_path.is_some());
    assert!(result.cover_path.is_none());
    assert!(result.message.contains("cover art missing"));
    assert!(!harness.path("Imagine Dragons - Believer.webp").exists());
}

#[tokio::test]
async fn test_file_names_are_sanitized() {
    let harness = TestHarness::new();
    harness
        .script_secondary("T.N.T?", "AC/DC", "https://www.youtube.com/watch?v=tnt", "AC_DC - T.N.T_.mp3")
        .await;
    harness.fetcher.set_body(COVER_URL, b"cover").await;

    let result = harness.acquire("acdc tnt").await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.audio_path, Some(harness.path("AC_DC - T.N.T_.mp3")));
    assert_eq!(result.cover_path, Some(harness.path("AC_DC - T.N.T_.webp")));

    let commands = harness.runner.recorded_commands().await;
    let args = commands[1].args_lossy();
    let expected = harness.path("AC_DC - T.N.T_.%(ext)s");
    assert_eq!(output_template(&args), expected.to_string_lossy());
}

#[tokio::test]
async fn test_download_without_file_fails() {
    let harness = TestHarness::new();
    harness
        .runner
        .push_success(vec![fixtures::ytdlp_json("Believer", "Imagine Dragons", BELIEVER_URL, &[]).as_str()])
        .await;
    harness.runner.push_success(vec!["[download] 100%"]).await;

    let result = harness.acquire("Imagine Dragons Believer").await;

    assert!(!result.success);
    assert!(result.message.contains("was not created"));
    assert!(result.metadata.is_some());
}

#[tokio::test]
async fn test_secondary_rate_limit_is_terminal() {
    let harness = TestHarness::new();
    harness
        .runner
        .push_success(vec!["ERROR: HTTP Error 429: rate limit exceeded"])
        .await;

    let result = harness.acquire("Imagine Dragons Believer").await;

    assert!(!result.success);
    assert!(!result.used_fallback);
    assert!(result.message.starts_with("secondary backend was rate limited"));
    assert!(harness.fetcher.recorded_requests().await.is_empty());
}

#[tokio::test]
async fn test_primary_reuses_existing_file() {
    let harness = TestHarness::new();
    std::fs::write(harness.path("Ed Sheeran - Shape of You.mp3"), b"already here").unwrap();
    harness
        .runner
        .push_success(vec![
            "Skipping Ed Sheeran - Shape of You (file already exists)",
            &fixtures::spotdl_downloaded_line("Ed Sheeran", "Shape of You", SERVICE_URL),
        ])
        .await;

    let result = harness.acquire(SERVICE_URL).await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.backend, Some(BackendKind::Primary));
    assert_eq!(
        result.audio_path,
        Some(harness.path("Ed Sheeran - Shape of You.mp3"))
    );
}

#[tokio::test]
async fn test_each_request_gets_its_own_id() {
    let harness = TestHarness::new();
    let first = harness.acquire("nothing scripted").await;
    let second = harness.acquire("nothing scripted").await;

    assert!(!first.success);
    assert!(!second.success);
    assert_ne!(first.request_id, second.request_id);
    assert!(first.started_at <= second.started_at);
}

#[tokio::test]
async fn test_track_text_mentioning_rate_and_limit_is_not_rate_limited() {
    let harness = TestHarness::new();
    let record = serde_json::json!({
        "title": "No Limit",
        "artist": "2 Unlimited",
        "duration": 226.0,
        "webpage_url": "https://www.youtube.com/watch?v=RkEXGgdqMz8",
        "description": "Provided to YouTube by Byte Records. Auto-generated by YouTube.",
        "url": "https://rr1.googlevideo.com/videoplayback?ratebypass=yes&mime=audio",
        "thumbnails": [],
    })
    .to_string();
    harness.runner.push_success(vec![record.as_str()]).await;
    let destination = format!(
        "[ExtractAudio] Destination: {}",
        harness.path("2 Unlimited - No Limit.mp3").display()
    );
    harness
        .runner
        .push_success_with_files(
            vec![destination.as_str()],
            vec![harness.path("2 Unlimited - No Limit.mp3")],
        )
        .await;

    let result = harness.acquire("2 Unlimited No Limit").await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.backend, Some(BackendKind::Secondary));
    assert_eq!(
        result.audio_path,
        Some(harness.path("2 Unlimited - No Limit.mp3"))
    );
    assert_eq!(harness.runner.recorded_commands().await.len(), 2);
}
