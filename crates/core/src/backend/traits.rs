//! Shared capability of download backends.

use std::fmt;

use crate::resolver::{MetadataError, TrackMetadata};
use crate::supervisor::CommandSpec;

/// Role a backend plays in an acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Service-URL downloader, tried first for URL requests.
    Primary,
    /// Search-based downloader, used for free text and as fallback.
    Secondary,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        })
    }
}

/// True when a line mentions both "rate" and "limit", ignoring case.
pub fn is_rate_limit_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("rate") && lower.contains("limit")
}

/// Adapter over one backend's output contract.
///
/// Keeps backend-specific text and JSON quirks out of the orchestrator.
pub trait BackendAdapter: Send + Sync {
    /// Tool name, for logs.
    fn name(&self) -> &str;

    fn kind(&self) -> BackendKind;

    /// Whether an output line signals that the remote service is throttling.
    fn is_rate_limit_signal(&self, line: &str) -> bool {
        is_rate_limit_line(line)
    }

    /// Extracts track metadata from captured output.
    fn parse_metadata(&self, lines: &[String]) -> Result<TrackMetadata, MetadataError>;

    /// Command that prints the tool version; used for availability checks.
    fn version_command(&self) -> CommandSpec;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_heuristic() {
        assert!(is_rate_limit_line("Your application has reached a rate/request limit."));
        assert!(is_rate_limit_line("RATE LIMIT exceeded"));
        assert!(is_rate_limit_line("ratelimited"));
        assert!(!is_rate_limit_line("Downloaded \"A - B\""));
        assert!(!is_rate_limit_line("limit reached"));
        assert!(!is_rate_limit_line("bitrate 320k"));
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Primary.to_string(), "primary");
        assert_eq!(BackendKind::Secondary.to_string(), "secondary");
    }
}
