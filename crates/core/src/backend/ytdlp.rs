//! Secondary backend: yt-dlp, driven by a search query.

use std::path::Path;

use serde::Deserialize;

use super::traits::{is_rate_limit_line, BackendAdapter, BackendKind};
use crate::config::{OutputConfig, SecondaryConfig};
use crate::resolver::{MetadataError, ThumbnailCandidate, TrackMetadata};
use crate::supervisor::CommandSpec;

/// Subset of a `--dump-json` record.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    artist: Option<String>,
    uploader: Option<String>,
    album: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
    thumbnail: Option<String>,
    thumbnails: Option<Vec<YtDlpThumbnail>>,
}

#[derive(Debug, Deserialize)]
struct YtDlpThumbnail {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// yt-dlp adapter.
#[derive(Debug, Clone)]
pub struct YtDlpBackend {
    secondary: SecondaryConfig,
    audio_format: String,
}

impl YtDlpBackend {
    pub fn new(secondary: &SecondaryConfig, output: &OutputConfig) -> Self {
        Self {
            secondary: secondary.clone(),
            audio_format: output.audio_format.clone(),
        }
    }

    fn base_command(&self) -> CommandSpec {
        CommandSpec::new(&self.secondary.program).args(&self.secondary.args)
    }

    /// Metadata-only lookup of the first search hit.
    pub fn search_command(&self, query: &str) -> CommandSpec {
        self.base_command()
            .arg(format!("ytsearch1:{}", query))
            .args(["--dump-json", "--no-download"])
    }

    /// Audio download of a resolved URL into `output_template`
    /// (a path ending in `.%(ext)s`).
    pub fn download_command(&self, url: &str, output_template: &Path) -> CommandSpec {
        self.base_command()
            .arg(url)
            .args([
                "--extract-audio",
                "--audio-format",
                self.audio_format.as_str(),
                "--audio-quality",
                "0",
                "--embed-thumbnail",
                "--embed-metadata",
                "--output",
            ])
            .arg(output_template)
            .arg("--no-playlist")
    }
}

impl BackendAdapter for YtDlpBackend {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Secondary
    }

    /// Only yt-dlp's own diagnostics count. JSON records, `[download]`
    /// progress and `Destination:` lines carry track titles and URLs, which
    /// can contain "rate" and "limit" on their own.
    fn is_rate_limit_signal(&self, line: &str) -> bool {
        let line = line.trim_start();
        (line.starts_with("ERROR:") || line.starts_with("WARNING:")) && is_rate_limit_line(line)
    }

    /// Parses the first output line holding a JSON object.
    fn parse_metadata(&self, lines: &[String]) -> Result<TrackMetadata, MetadataError> {
        let record = lines
            .iter()
            .map(|line| line.trim())
            .find(|line| line.starts_with('{'))
            .ok_or(MetadataError::NoRecord)?;

        let info: YtDlpInfo =
            serde_json::from_str(record).map_err(|e| MetadataError::Malformed(e.to_string()))?;

        let source_url = info
            .webpage_url
            .filter(|u| !u.is_empty())
            .ok_or(MetadataError::MissingField("webpage_url"))?;

        let mut thumbnails: Vec<ThumbnailCandidate> = info
            .thumbnails
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| {
                let url = t.url?;
                Some(ThumbnailCandidate::new(
                    url,
                    t.width.unwrap_or(0),
                    t.height.unwrap_or(0),
                ))
            })
            .collect();
        if thumbnails.is_empty() {
            if let Some(url) = info.thumbnail.filter(|u| !u.is_empty()) {
                thumbnails.push(ThumbnailCandidate::new(url, 0, 0));
            }
        }

        let artist = info
            .artist
            .filter(|a| !a.is_empty())
            .or(info.uploader)
            .unwrap_or_else(|| "Unknown".to_string());
        let duration_secs = info
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d.round() as u64)
            .unwrap_or(0);

        Ok(TrackMetadata::new(
            info.title.unwrap_or_else(|| "Unknown".to_string()),
            artist,
            info.album,
            duration_secs,
            source_url,
            thumbnails,
        ))
    }

    fn version_command(&self) -> CommandSpec {
        self.base_command().arg("--version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn backend() -> YtDlpBackend {
        YtDlpBackend::new(&SecondaryConfig::default(), &OutputConfig::default())
    }

    fn lines(json: &str) -> Vec<String> {
        vec![
            "WARNING: [youtube] Falling back to generic n function search".to_string(),
            json.to_string(),
        ]
    }

    #[test]
    fn test_rate_limit_signal_ignores_track_text() {
        let backend = backend();
        let record = r#"{"title": "No Limit", "artist": "2 Unlimited", "description": "Provided to YouTube. Auto-generated by YouTube.", "url": "https://rr1.googlevideo.com/videoplayback?ratebypass=yes"}"#;
        assert!(!backend.is_rate_limit_signal(record));
        assert!(!backend.is_rate_limit_signal(
            "[ExtractAudio] Destination: downloads/2 Unlimited - No Limit.mp3"
        ));
        assert!(!backend.is_rate_limit_signal(
            "[download] Destination: downloads/Limp Bizkit - Rollin' (Air Raid Vehicle).webm"
        ));

        assert!(backend.is_rate_limit_signal("ERROR: [youtube] abc: HTTP Error 429: rate limit exceeded"));
        assert!(backend.is_rate_limit_signal(
            "WARNING: [youtube] Rate-limited by YouTube, try again later (limit reached)"
        ));
    }

    #[test]
    fn test_search_command() {
        let cmd = backend().search_command("Imagine Dragons Believer");
        assert_eq!(cmd.program, PathBuf::from("yt-dlp"));
        assert_eq!(
            cmd.args_lossy(),
            vec!["ytsearch1:Imagine Dragons Believer", "--dump-json", "--no-download"]
        );
    }

    #[test]
    fn test_download_command() {
        let cmd = backend().download_command(
            "https://www.youtube.com/watch?v=7wtfhZwyrcc",
            Path::new("downloads/Imagine Dragons - Believer.%(ext)s"),
        );
        assert_eq!(
            cmd.args_lossy(),
            vec![
                "https://www.youtube.com/watch?v=7wtfhZwyrcc",
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "0",
                "--embed-thumbnail",
                "--embed-metadata",
                "--output",
                "downloads/Imagine Dragons - Believer.%(ext)s",
                "--no-playlist",
            ]
        );
    }

    #[test]
    fn test_parse_full_record() {
        let json = r#"{"title": "Believer", "artist": "Imagine Dragons", "uploader": "ImagineDragonsVEVO", "album": "Evolve", "duration": 204.4, "webpage_url": "https://www.youtube.com/watch?v=7wtfhZwyrcc", "thumbnail": "https://i.ytimg.com/vi/7wtfhZwyrcc/hqdefault.jpg", "thumbnails": [{"url": "https://i.ytimg.com/a.jpg", "width": 100, "height": 100}, {"url": "https://i.ytimg.com/b.jpg", "width": 500, "height": 500}, {"url": "https://i.ytimg.com/c.jpg", "width": 200, "height": 900}]}"#;
        let meta = backend().parse_metadata(&lines(json)).unwrap();

        assert_eq!(meta.title(), "Believer");
        assert_eq!(meta.artist(), "Imagine Dragons");
        assert_eq!(meta.album(), Some("Evolve"));
        assert_eq!(meta.duration_secs(), 204);
        assert_eq!(meta.source_url(), "https://www.youtube.com/watch?v=7wtfhZwyrcc");
        assert_eq!(meta.thumbnails().len(), 3);
        assert_eq!(meta.selected_thumbnail_url(), Some("https://i.ytimg.com/b.jpg"));
    }

    #[test]
    fn test_parse_falls_back_to_uploader_and_single_thumbnail() {
        let json = r#"{"title": "Some Song", "uploader": "Some Channel", "duration": null, "webpage_url": "https://www.youtube.com/watch?v=abc", "thumbnail": "https://i.ytimg.com/vi/abc/hqdefault.jpg", "thumbnails": []}"#;
        let meta = backend().parse_metadata(&lines(json)).unwrap();

        assert_eq!(meta.artist(), "Some Channel");
        assert_eq!(meta.album(), None);
        assert_eq!(meta.duration_secs(), 0);
        assert_eq!(
            meta.selected_thumbnail_url(),
            Some("https://i.ytimg.com/vi/abc/hqdefault.jpg")
        );
    }

    #[test]
    fn test_parse_missing_dimensions_count_as_zero() {
        let json = r#"{"title": "T", "artist": "A", "webpage_url": "https://www.youtube.com/watch?v=abc", "thumbnails": [{"url": "https://x/nodims.jpg"}, {"url": "https://x/small.jpg", "width": 10, "height": 10}]}"#;
        let meta = backend().parse_metadata(&lines(json)).unwrap();
        assert_eq!(meta.selected_thumbnail_url(), Some("https://x/small.jpg"));
    }

    #[test]
    fn test_parse_defaults_unknown() {
        let json = r#"{"webpage_url": "https://www.youtube.com/watch?v=abc"}"#;
        let meta = backend().parse_metadata(&lines(json)).unwrap();
        assert_eq!(meta.title(), "Unknown");
        assert_eq!(meta.artist(), "Unknown");
    }

    #[test]
    fn test_parse_no_json() {
        let lines = vec!["ERROR: [youtube:search] Unable to download".to_string()];
        assert!(matches!(
            backend().parse_metadata(&lines),
            Err(MetadataError::NoRecord)
        ));
    }

    #[test]
    fn test_parse_malformed_json() {
        let lines = vec!["{\"title\": \"Believer\", ".to_string()];
        assert!(matches!(
            backend().parse_metadata(&lines),
            Err(MetadataError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_missing_webpage_url() {
        let lines = vec![r#"{"title": "Believer"}"#.to_string()];
        assert!(matches!(
            backend().parse_metadata(&lines),
            Err(MetadataError::MissingField("webpage_url"))
        ));
    }
}
