//! Acquisition orchestrator.
//!
//! Turns one operator request into one [`AcquisitionResult`]:
//! - **Service URLs** run the primary backend, falling back once to the
//!   secondary backend when the primary is rate limited
//! - **Free text** runs the secondary pipeline directly (resolve metadata,
//!   download audio, fetch cover)
//!
//! Requests are handled one at a time with no state carried between them.

mod files;
mod runner;
mod types;

pub use files::{cover_extension, list_audio_files, newest_new_file, sanitize_filename};
pub use runner::AcquisitionOrchestrator;
pub use types::{AcquisitionRequest, AcquisitionResult, BackendStatus};
