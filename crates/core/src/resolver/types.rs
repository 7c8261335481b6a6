//! Track metadata types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One cover-art variant offered by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailCandidate {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl ThumbnailCandidate {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }

    /// Pixel area, used to rank candidates.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Picks the candidate with the largest area. Equal areas keep the first.
pub fn select_thumbnail(candidates: &[ThumbnailCandidate]) -> Option<&ThumbnailCandidate> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(current) if current.area() >= candidate.area() => Some(current),
        _ => Some(candidate),
    })
}

/// Normalized description of a track, independent of the backend that
/// produced it.
///
/// Built once through [`TrackMetadata::new`], which derives the selected
/// thumbnail; there are no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    title: String,
    artist: String,
    album: Option<String>,
    duration_secs: u64,
    source_url: String,
    thumbnails: Vec<ThumbnailCandidate>,
    selected_thumbnail_url: Option<String>,
}

impl TrackMetadata {
    /// Creates a metadata record. Candidates with an empty URL are dropped.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: Option<String>,
        duration_secs: u64,
        source_url: impl Into<String>,
        thumbnails: Vec<ThumbnailCandidate>,
    ) -> Self {
        let thumbnails: Vec<ThumbnailCandidate> = thumbnails
            .into_iter()
            .filter(|t| !t.url.is_empty())
            .collect();
        let selected_thumbnail_url = select_thumbnail(&thumbnails).map(|t| t.url.clone());

        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.filter(|a| !a.is_empty()),
            duration_secs,
            source_url: source_url.into(),
            thumbnails,
            selected_thumbnail_url,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn album(&self) -> Option<&str> {
        self.album.as_deref()
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn thumbnails(&self) -> &[ThumbnailCandidate] {
        &self.thumbnails
    }

    /// URL of the largest thumbnail; present whenever there are thumbnails.
    pub fn selected_thumbnail_url(&self) -> Option<&str> {
        self.selected_thumbnail_url.as_deref()
    }

    /// `"artist - title"`, the basis for output file names.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

/// Backend output that could not be turned into [`TrackMetadata`].
#[derive(Debug, Error)]
pub enum MetadataError {
    /// No structured record in the output at all.
    #[error("backend output contained no metadata record")]
    NoRecord,

    /// A record was found but could not be decoded.
    #[error("malformed metadata record: {0}")]
    Malformed(String),

    /// The record lacks a field the pipeline needs.
    #[error("metadata record is missing `{0}`")]
    MissingField(&'static str),
}
