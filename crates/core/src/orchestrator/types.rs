//! Types for the acquisition orchestrator.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::BackendKind;
use crate::resolver::TrackMetadata;

/// One operator request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AcquisitionRequest {
    /// Free text, resolved through the search backend.
    SearchQuery(String),
    /// A track URL on the primary backend's service.
    ServiceUrl(String),
}

impl AcquisitionRequest {
    /// Classifies raw input: anything containing `service_domain` is a
    /// service URL, everything else a search query.
    pub fn classify(input: &str, service_domain: &str) -> Self {
        let input = input.trim();
        if !service_domain.is_empty() && input.contains(service_domain) {
            Self::ServiceUrl(input.to_string())
        } else {
            Self::SearchQuery(input.to_string())
        }
    }

    /// The query or URL text.
    pub fn text(&self) -> &str {
        match self {
            Self::SearchQuery(text) | Self::ServiceUrl(text) => text,
        }
    }
}

impl fmt::Display for AcquisitionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SearchQuery(query) => write!(f, "search \"{}\"", query),
            Self::ServiceUrl(url) => write!(f, "url {}", url),
        }
    }
}

/// Final record of one request; the only output of the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionResult {
    /// Per-request id, also attached to the request's log span.
    pub request_id: Uuid,
    pub request: AcquisitionRequest,
    /// True only when an audio file exists on disk.
    pub success: bool,
    pub audio_path: Option<PathBuf>,
    pub cover_path: Option<PathBuf>,
    pub metadata: Option<TrackMetadata>,
    /// Human-readable summary; on failure, the error plus backend output.
    pub message: String,
    /// Backend that produced the audio file.
    pub backend: Option<BackendKind>,
    /// Whether the primary backend was rate limited and the secondary used.
    pub used_fallback: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Result of probing one backend executable.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub kind: BackendKind,
    pub name: String,
    pub available: bool,
    /// Version line when available, failure reason otherwise.
    pub detail: Option<String>,
}

/// Files produced by a successful pipeline.
#[derive(Debug, Clone)]
pub(crate) struct Acquired {
    pub audio_path: PathBuf,
    pub cover_path: Option<PathBuf>,
    pub backend: BackendKind,
}

/// Facts gathered while a request runs, kept even when it fails.
#[derive(Debug, Default)]
pub(crate) struct Attempt {
    pub metadata: Option<TrackMetadata>,
    pub used_fallback: bool,
    pub notes: Vec<String>,
}
