//! Metadata resolution.
//!
//! - [`MetadataResolver::resolve_by_query`] asks the search backend for the
//!   first hit in metadata-only mode and normalizes it to [`TrackMetadata`]
//! - [`TitleLookup::resolve_title_from_url`] scrapes a service page for a
//!   human title, used to derive fallback queries

mod metadata_resolver;
mod page_title;
mod types;

pub use metadata_resolver::{MetadataResolver, TitleLookup};
pub use page_title::extract_page_title;
pub use types::{select_thumbnail, MetadataError, ThumbnailCandidate, TrackMetadata};
