//! Primary backend: spotdl, driven by a service URL.

use std::path::Path;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::traits::{BackendAdapter, BackendKind};
use crate::config::{OutputConfig, PrimaryConfig};
use crate::resolver::{MetadataError, TrackMetadata};
use crate::supervisor::CommandSpec;

/// Matches spotdl's completion line: `Downloaded "Artist - Title": <url>`.
static DOWNLOADED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"Downloaded "(.+)": (\S+)"#).expect("valid regex"));

/// spotdl adapter.
#[derive(Debug, Clone)]
pub struct SpotdlBackend {
    primary: PrimaryConfig,
    audio_format: String,
    bitrate: String,
}

impl SpotdlBackend {
    pub fn new(primary: &PrimaryConfig, output: &OutputConfig) -> Self {
        Self {
            primary: primary.clone(),
            audio_format: output.audio_format.clone(),
            bitrate: output.bitrate.clone(),
        }
    }

    fn base_command(&self) -> CommandSpec {
        CommandSpec::new(&self.primary.program).args(&self.primary.args)
    }

    /// `<url> --output <dir> --format <ext> --bitrate <bitrate>`
    pub fn download_command(&self, url: &str, output_dir: &Path) -> CommandSpec {
        self.base_command()
            .arg(url)
            .arg("--output")
            .arg(output_dir)
            .args(["--format", self.audio_format.as_str(), "--bitrate", self.bitrate.as_str()])
    }
}

impl BackendAdapter for SpotdlBackend {
    fn name(&self) -> &str {
        "spotdl"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Primary
    }

    fn parse_metadata(&self, lines: &[String]) -> Result<TrackMetadata, MetadataError> {
        let caps = lines
            .iter()
            .find_map(|line| DOWNLOADED_LINE.captures(line))
            .ok_or(MetadataError::NoRecord)?;

        let display = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let source_url = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        let (artist, title) = match display.split_once(" - ") {
            Some((artist, title)) => (artist.trim(), title.trim()),
            None => ("Unknown", display.trim()),
        };
        if title.is_empty() {
            return Err(MetadataError::MissingField("title"));
        }

        Ok(TrackMetadata::new(
            title,
            artist,
            None,
            0,
            source_url,
            Vec::new(),
        ))
    }

    fn version_command(&self) -> CommandSpec {
        self.base_command().arg("--version")
    }
}
