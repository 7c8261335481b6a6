use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub primary: PrimaryConfig,
    #[serde(default)]
    pub secondary: SecondaryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and how audio files are written
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Audio file extension / codec requested from the backends
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    /// Bitrate passed to the primary backend (e.g. "320k")
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            audio_format: default_audio_format(),
            bitrate: default_bitrate(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_bitrate() -> String {
    "320k".to_string()
}

/// Primary backend: the service-URL downloader (spotdl)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrimaryConfig {
    #[serde(default = "default_primary_program")]
    pub program: PathBuf,
    /// Arguments placed before the request arguments (e.g. ["-m", "spotdl"]
    /// when `program` is a Python interpreter)
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_primary_timeout")]
    pub timeout_secs: u64,
    /// Requests containing this substring are service URLs
    #[serde(default = "default_service_domain")]
    pub service_domain: String,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            program: default_primary_program(),
            args: Vec::new(),
            timeout_secs: default_primary_timeout(),
            service_domain: default_service_domain(),
        }
    }
}

impl PrimaryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_primary_program() -> PathBuf {
    PathBuf::from("spotdl")
}

fn default_primary_timeout() -> u64 {
    120
}

fn default_service_domain() -> String {
    "spotify.com".to_string()
}

/// Secondary backend: the search-based downloader (yt-dlp)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecondaryConfig {
    #[serde(default = "default_secondary_program")]
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Budget for the metadata-only search call
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,
    /// Budget for the audio download call
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            program: default_secondary_program(),
            args: Vec::new(),
            metadata_timeout_secs: default_metadata_timeout(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

impl SecondaryConfig {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

fn default_secondary_program() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_metadata_timeout() -> u64 {
    60
}

fn default_download_timeout() -> u64 {
    300
}

/// HTTP settings for page scraping and cover downloads
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,
    #[serde(default = "default_cover_timeout")]
    pub cover_timeout_secs: u64,
    /// Suffix stripped from a page `<title>` (e.g. " | Spotify")
    #[serde(default = "default_branding_suffix")]
    pub branding_suffix: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_timeout_secs: default_page_timeout(),
            cover_timeout_secs: default_cover_timeout(),
            branding_suffix: default_branding_suffix(),
        }
    }
}

impl HttpConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn cover_timeout(&self) -> Duration {
        Duration::from_secs(self.cover_timeout_secs)
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_page_timeout() -> u64 {
    10
}

fn default_cover_timeout() -> u64 {
    30
}

fn default_branding_suffix() -> String {
    " | Spotify".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Echo every backend output line at info level
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose: default_verbose(),
        }
    }
}

fn default_verbose() -> bool {
    true
}
